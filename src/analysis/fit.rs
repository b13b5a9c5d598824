use nalgebra::{DMatrix, DVector};

use crate::config::FitConfig;
use crate::solver::{LevenbergMarquardt, LevenbergMarquardtConfig};

/// Number of parameters of a growth model.
pub const N_PARAMS: usize = 4;

/// Optimal parameters of a least-squares curve fit.
#[derive(Debug, Clone)]
pub struct CurveFit {
    /// Parameters in model order
    pub parameters: [f64; N_PARAMS],
    /// Estimated covariance of `parameters`; all `+∞` when it cannot be estimated
    pub covariance: DMatrix<f64>,
    /// Sum of squared residuals at the optimum
    pub sum_of_squares: f64,
    /// Number of model sweeps over the data the solver used
    pub evaluations: usize,
}

impl CurveFit {
    /// One standard deviation error on each parameter.
    ///
    /// Negative variances from numerical noise are clipped to zero. Returns
    /// `None` when the covariance could not be estimated at all.
    pub fn standard_deviations(&self) -> Option<[f64; N_PARAMS]> {
        if self.covariance.iter().all(|v| v.is_infinite()) {
            return None;
        }
        let mut out = [0.0; N_PARAMS];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.covariance[(i, i)].max(0.0).sqrt();
        }
        Some(out)
    }
}

/// Fit `model` to `(timestamps, measurements)` by non-linear least squares.
///
/// `model` maps an elapsed time and a parameter vector to a predicted
/// measurement. Returns `None` when the inputs cannot be fitted or the solver
/// does not converge; failures are logged, never returned.
pub fn fit_curve<F>(
    model: F,
    timestamps: &[f64],
    measurements: &[f64],
    initial_params: [f64; N_PARAMS],
    config: &FitConfig,
) -> Option<CurveFit>
where
    F: Fn(f64, &[f64; N_PARAMS]) -> f64,
{
    if timestamps.is_empty() || timestamps.len() != measurements.len() {
        tracing::warn!(
            timestamps = timestamps.len(),
            measurements = measurements.len(),
            "cannot fit curve to empty or mismatched data"
        );
        return None;
    }

    let n = timestamps.len();
    let residuals = |x: &DVector<f64>| {
        let params = [x[0], x[1], x[2], x[3]];
        DVector::from_iterator(
            n,
            timestamps
                .iter()
                .zip(measurements)
                .map(|(&t, &y)| model(t, &params) - y),
        )
    };

    let solver = LevenbergMarquardt::new(LevenbergMarquardtConfig {
        max_evaluations: config.evaluation_budget(N_PARAMS),
        ftol: config.ftol,
        xtol: config.xtol,
        gtol: config.gtol,
        initial_lambda: config.initial_lambda,
    });

    let solution = match solver.minimize(residuals, DVector::from_row_slice(&initial_params)) {
        Ok(solution) => solution,
        Err(e) => {
            tracing::warn!(error = %e, ?initial_params, "optimal parameters not found");
            return None;
        }
    };

    let p = &solution.parameters;
    Some(CurveFit {
        parameters: [p[0], p[1], p[2], p[3]],
        covariance: covariance(&solution.jacobian, solution.sum_of_squares),
        sum_of_squares: solution.sum_of_squares,
        evaluations: solution.evaluations,
    })
}

/// `(JᵀJ)⁻¹ · SSE / (n - p)`, or all `+∞` when that is undefined.
fn covariance(jacobian: &DMatrix<f64>, sum_of_squares: f64) -> DMatrix<f64> {
    let (n, p) = jacobian.shape();
    let undefined = || DMatrix::from_element(p, p, f64::INFINITY);

    if n <= p {
        return undefined();
    }

    match jacobian.tr_mul(jacobian).try_inverse() {
        Some(inverse) if inverse.iter().all(|v| v.is_finite()) => {
            inverse * (sum_of_squares / (n - p) as f64)
        }
        _ => undefined(),
    }
}
