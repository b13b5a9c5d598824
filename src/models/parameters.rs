use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Seconds in one hour; growth rates are fitted per hour and reported per second.
pub const SECONDS_PER_HOUR: f64 = 3600.0;

/// The four parameters of a growth model, in the order the solver sees them.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Initial growth measurement
    pub initial_size: f64,
    /// Lag time in seconds
    pub lag_time: f64,
    /// Maximum specific growth rate
    pub growth_rate: f64,
    /// Asymptotic maximum size, A
    pub carrying_capacity: f64,
}

impl ModelParameters {
    pub fn to_array(self) -> [f64; 4] {
        [
            self.initial_size,
            self.lag_time,
            self.growth_rate,
            self.carrying_capacity,
        ]
    }

    pub fn from_array(values: [f64; 4]) -> Self {
        Self {
            initial_size: values[0],
            lag_time: values[1],
            growth_rate: values[2],
            carrying_capacity: values[3],
        }
    }
}

/// Parameters produced by one growth curve fit.
///
/// A default value (all zero) means the growth could not be characterised.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FittedParameters {
    /// Raw lag time in seconds; may be negative as a fitting artifact
    pub lag_time_seconds: f64,
    /// Maximum growth rate in log2[area] per second
    pub growth_rate: f64,
    /// Carrying capacity in log2[area]
    pub carrying_capacity: f64,
    /// Standard deviations of the fitted model parameters, when estimable
    pub std_devs: Option<ModelParameters>,
    /// Whether the solver produced a fit
    pub converged: bool,
}

impl FittedParameters {
    /// Lag time as a duration, clamped to zero.
    pub fn lag_time(&self) -> Duration {
        if self.lag_time_seconds > 0.0 {
            Duration::try_from_secs_f64(self.lag_time_seconds).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }

    /// Time to double in size at the maximal growth rate, `ln 2 / μmax`.
    ///
    /// Zero when the growth rate is not positive.
    pub fn doubling_time(&self) -> Duration {
        if self.growth_rate > 0.0 {
            Duration::try_from_secs_f64(std::f64::consts::LN_2 / self.growth_rate)
                .unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_array_roundtrip_order() {
        let params = ModelParameters::from_array([1.0, 2.0, 3.0, 4.0]);
        assert_eq!(params.initial_size, 1.0);
        assert_eq!(params.lag_time, 2.0);
        assert_eq!(params.growth_rate, 3.0);
        assert_eq!(params.carrying_capacity, 4.0);
        assert_eq!(params.to_array(), [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_default_fit_is_zero() {
        let fitted = FittedParameters::default();
        assert_eq!(fitted.lag_time(), Duration::ZERO);
        assert_eq!(fitted.doubling_time(), Duration::ZERO);
        assert!(!fitted.converged);
    }

    #[test]
    fn test_negative_lag_clamped() {
        let fitted = FittedParameters {
            lag_time_seconds: -1200.0,
            ..Default::default()
        };
        assert_eq!(fitted.lag_time(), Duration::ZERO);
    }

    #[test]
    fn test_nan_lag_clamped() {
        let fitted = FittedParameters {
            lag_time_seconds: f64::NAN,
            ..Default::default()
        };
        assert_eq!(fitted.lag_time(), Duration::ZERO);
    }

    #[test]
    fn test_positive_lag_kept() {
        let fitted = FittedParameters {
            lag_time_seconds: 5.0 * SECONDS_PER_HOUR,
            ..Default::default()
        };
        assert_eq!(fitted.lag_time(), Duration::from_secs(18_000));
    }

    #[test]
    fn test_doubling_time_from_rate() {
        let rate = 0.3 / SECONDS_PER_HOUR;
        let fitted = FittedParameters {
            growth_rate: rate,
            ..Default::default()
        };
        assert_approx_eq!(
            fitted.doubling_time().as_secs_f64(),
            std::f64::consts::LN_2 / rate,
            1e-6
        );
    }

    #[test]
    fn test_doubling_time_zero_for_non_positive_rate() {
        for rate in [0.0, -0.5] {
            let fitted = FittedParameters {
                growth_rate: rate,
                ..Default::default()
            };
            assert_eq!(fitted.doubling_time(), Duration::ZERO);
        }
    }

    #[test]
    fn test_doubling_time_saturates_for_tiny_rate() {
        let fitted = FittedParameters {
            growth_rate: 1e-300,
            ..Default::default()
        };
        assert_eq!(fitted.doubling_time(), Duration::MAX);
    }
}
