use serde::{Deserialize, Serialize};

use super::statistics::{differences, linear_regression, mean, population_std_dev, LinearFit};
use crate::error::GrowthError;

/// Heuristic starting point for curve fitting.
///
/// Units follow the inputs: `lag_time` in the timestamp unit, `growth_rate`
/// in measurement units per timestamp unit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InitialEstimate {
    pub lag_time: f64,
    pub growth_rate: f64,
    pub carrying_capacity: f64,
}

/// Estimate lag time, growth rate and carrying capacity from raw measurements.
///
/// Lag time: the inflection point is approximated as the first point where the
/// difference between measurements exceeds the mean difference plus one
/// standard deviation. When the growth rate can be found by regression, the
/// time-axis intercept of the steepest regression line is used instead.
///
/// Growth rate: the steepest least-squares slope over a sliding window of
/// `window` points, starting at the inflection point.
///
/// Carrying capacity: the largest measurement plus the standard deviation of
/// the differences between measurements.
///
/// An empty input gives an all-zero estimate. Inputs of different lengths, or
/// shorter than `window`, are rejected.
///
/// # Examples
///
/// ```
/// use colony_growth::analysis::estimate_parameters;
///
/// assert_eq!(estimate_parameters(&[], &[], 10).unwrap().growth_rate, 0.0);
/// assert!(estimate_parameters(&[0.0, 1.0], &[1.0], 10).is_err());
/// ```
pub fn estimate_parameters(
    timestamps: &[f64],
    measurements: &[f64],
    window: usize,
) -> Result<InitialEstimate, GrowthError> {
    if timestamps.is_empty() || measurements.is_empty() {
        return Ok(InitialEstimate::default());
    }

    if timestamps.len() != measurements.len() {
        return Err(GrowthError::InvalidArgument(format!(
            "The timestamps ({} elements) and measurements ({} elements) must contain the same number of elements",
            timestamps.len(),
            measurements.len()
        )));
    }

    if timestamps.len() < window {
        return Err(GrowthError::InvalidArgument(format!(
            "At least {window} measurements are required to estimate growth parameters, got {}",
            timestamps.len()
        )));
    }

    let diffs = differences(measurements);
    let diff_mean = mean(&diffs);
    let diff_std = population_std_dev(&diffs);

    let max_measurement = measurements.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let carrying_capacity = max_measurement + diff_std;

    // Onset of the exponential phase; a curve with no outlying step starts at 0
    let threshold = diff_mean + diff_std;
    let inflection = diffs.iter().position(|&d| d > threshold).unwrap_or(0);

    let steepest = steepest_window(timestamps, measurements, inflection, window);

    let (lag_time, growth_rate) = match steepest {
        Some(fit) if fit.slope != 0.0 => (-fit.intercept / fit.slope, fit.slope),
        Some(fit) => (timestamps[inflection / 2], fit.slope),
        None => {
            let max_diff = diffs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (timestamps[inflection / 2], max_diff)
        }
    };

    tracing::debug!(
        inflection,
        lag_time,
        growth_rate,
        carrying_capacity,
        "estimated initial growth parameters"
    );

    Ok(InitialEstimate {
        lag_time,
        growth_rate,
        carrying_capacity,
    })
}

/// Steepest regression line over windows starting in `start..len - window`.
///
/// Ties on slope are broken by the larger intercept.
fn steepest_window(
    timestamps: &[f64],
    measurements: &[f64],
    start: usize,
    window: usize,
) -> Option<LinearFit> {
    let end = timestamps.len().saturating_sub(window);

    (start..end)
        .filter_map(|i| {
            linear_regression(&timestamps[i..i + window], &measurements[i..i + window])
        })
        .filter(|fit| fit.slope.is_finite() && fit.intercept.is_finite())
        .max_by(|a, b| {
            a.slope
                .total_cmp(&b.slope)
                .then(a.intercept.total_cmp(&b.intercept))
        })
}
