mod series;
mod parameters;

pub use series::{GrowthSeries, GrowthSource};
pub use parameters::{FittedParameters, ModelParameters, SECONDS_PER_HOUR};
