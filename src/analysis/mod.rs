mod curve;
mod estimate;
mod fit;
mod gompertz;
mod statistics;

pub use curve::{FitSummary, GrowthCurve};
pub use estimate::{estimate_parameters, InitialEstimate};
pub use fit::{fit_curve, CurveFit, N_PARAMS};
pub use gompertz::{gompertz, gompertz_offset, log_sum_exp, GrowthModel};
pub use statistics::{differences, linear_regression, LinearFit};
