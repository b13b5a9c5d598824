//! Parametrized Gompertz growth model.
//!
//! Zwietering et al. 1990 reparametrization, with the offset constant from
//! Herricks et al. 2016 (doi: 10.1534/g3.116.037044).

use std::f64::consts::E;

/// Signature shared by growth models:
/// `(elapsed_time, initial_size, lag_time, growth_rate, carrying_capacity) -> size`.
pub type GrowthModel = fn(f64, f64, f64, f64, f64) -> f64;

/// `ln((3 + √5) / 2)`, the offset that places the maximum slope of the curve at `μmax`.
pub fn gompertz_offset() -> f64 {
    ((3.0 + 5.0f64.sqrt()) / 2.0).ln()
}

/// Evaluate the Gompertz function at `elapsed_time`.
///
/// ```text
/// y(t) = y0 + A * exp(-exp((μ·e / A)·(λ - t) + ln((3 + √5) / 2)))
/// ```
///
/// Returns `0.0` instead of propagating an overflow or a division by zero, so
/// the solver sees a poor candidate rather than a non-finite residual.
///
/// # Examples
///
/// ```
/// use colony_growth::analysis::gompertz;
///
/// let at_lag = gompertz(3600.0, 0.0, 3600.0, 0.001, 10.0);
/// let expected = 10.0 * (-(3.0 + 5.0f64.sqrt()) / 2.0).exp();
/// assert!((at_lag - expected).abs() < 1e-12);
/// ```
pub fn gompertz(
    elapsed_time: f64,
    initial_size: f64,
    lag_time: f64,
    growth_rate: f64,
    carrying_capacity: f64,
) -> f64 {
    if carrying_capacity == 0.0 {
        return 0.0;
    }

    let exponent = ((growth_rate * E) / carrying_capacity) * (lag_time - elapsed_time)
        + gompertz_offset();
    let inner = log_sum_exp(&[exponent]).exp();
    if inner.is_nan() || inner.is_infinite() {
        return 0.0;
    }

    let value = initial_size + carrying_capacity * (-inner).exp();
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// `ln(Σ exp(v))`, shifted by the largest value to avoid overflow.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_infinite() {
        return max;
    }
    let sum: f64 = values.iter().map(|v| (v - max).exp()).sum();
    max + sum.ln()
}
