use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::estimate::estimate_parameters;
use super::fit::{fit_curve, N_PARAMS};
use super::gompertz::{gompertz, GrowthModel};
use crate::config::FitConfig;
use crate::models::{FittedParameters, GrowthSource, ModelParameters, SECONDS_PER_HOUR};

/// Growth curve parameters derived from a [`GrowthSource`].
///
/// The curve is fitted lazily: the first accessor call runs
/// [`fit_growth_curve`](Self::fit_growth_curve) with the default Gompertz model
/// and the result is cached until [`refit`](Self::refit) is called.
///
/// # Examples
///
/// ```
/// use colony_growth::{GrowthCurve, GrowthSeries};
/// use std::time::Duration;
///
/// let mut curve = GrowthCurve::new(GrowthSeries::new());
/// assert_eq!(curve.growth_rate(), 0.0);
/// assert_eq!(curve.lag_time(), Duration::ZERO);
/// ```
#[derive(Debug, Clone)]
pub struct GrowthCurve<S> {
    source: S,
    config: FitConfig,
    fitted: Option<FittedParameters>,
    /// Number of points the cached fit was computed from
    points: usize,
}

impl<S: GrowthSource> GrowthCurve<S> {
    /// Create an unfitted curve over `source` with default settings.
    pub fn new(source: S) -> Self {
        Self::with_config(source, FitConfig::default())
    }

    pub fn with_config(source: S, config: FitConfig) -> Self {
        Self {
            source,
            config,
            fitted: None,
            points: 0,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Whether a fit has been computed and cached.
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Drop the cached fit so the next accessor fits again.
    pub fn refit(&mut self) {
        self.fitted = None;
    }

    /// Fit a parametrized growth model (Gompertz by default) to the source data.
    ///
    /// Ref: Modeling of the Bacterial Growth Curve, Zwietering et al. 1990.
    ///
    /// `initial_params` are `[initial_size, lag_time (s), growth_rate (per hour),
    /// carrying_capacity]`; when absent they are estimated from the data. The
    /// model always receives its growth rate per second.
    ///
    /// Never fails: data that cannot be fitted yields all-zero parameters.
    pub fn fit_growth_curve(
        &mut self,
        growth_model: Option<GrowthModel>,
        initial_params: Option<[f64; N_PARAMS]>,
    ) -> &FittedParameters {
        let growth_model = growth_model.unwrap_or(gompertz);
        let series = self.source.growth_curve_data();
        let timestamps = series.timestamps();
        let measurements = series.measurements();
        self.points = timestamps.len();

        let mut fitted = FittedParameters::default();

        if !timestamps.is_empty() {
            let seed = initial_params
                .unwrap_or_else(|| self.initial_params(&timestamps, &measurements));

            let model = |t: f64, p: &[f64; N_PARAMS]| {
                growth_model(t, p[0], p[1], p[2] / SECONDS_PER_HOUR, p[3])
            };

            if let Some(fit) = fit_curve(model, &timestamps, &measurements, seed, &self.config) {
                let [_, lag_time, growth_rate, carrying_capacity] = fit.parameters;
                fitted = FittedParameters {
                    lag_time_seconds: lag_time,
                    growth_rate: growth_rate / SECONDS_PER_HOUR,
                    carrying_capacity,
                    std_devs: fit.standard_deviations().map(|sd| {
                        let mut sd = ModelParameters::from_array(sd);
                        sd.growth_rate /= SECONDS_PER_HOUR;
                        sd
                    }),
                    converged: true,
                };
                tracing::debug!(
                    points = timestamps.len(),
                    lag_time,
                    growth_rate = fitted.growth_rate,
                    carrying_capacity,
                    "fitted growth curve"
                );
            }
        }

        self.fitted.insert(fitted)
    }

    /// Seeds from the heuristic estimator, growth rate converted to per hour.
    fn initial_params(&self, timestamps: &[f64], measurements: &[f64]) -> [f64; N_PARAMS] {
        let estimate = estimate_parameters(timestamps, measurements, self.config.window)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "cannot estimate initial parameters, seeding with zeros");
                Default::default()
            });
        let min_measurement = measurements.iter().copied().fold(f64::INFINITY, f64::min);

        [
            min_measurement,
            estimate.lag_time,
            estimate.growth_rate * SECONDS_PER_HOUR,
            estimate.carrying_capacity,
        ]
    }

    fn ensure_fitted(&mut self) -> &FittedParameters {
        if self.fitted.is_none() {
            self.fit_growth_curve(None, None);
        }
        self.fitted.get_or_insert_with(FittedParameters::default)
    }

    /// All fitted parameters.
    pub fn parameters(&mut self) -> FittedParameters {
        *self.ensure_fitted()
    }

    /// The maximal population size, A, in log2[area].
    pub fn carrying_capacity(&mut self) -> f64 {
        self.ensure_fitted().carrying_capacity
    }

    /// The maximum specific growth rate, μmax, in log2[area] per second.
    pub fn growth_rate(&mut self) -> f64 {
        self.ensure_fitted().growth_rate
    }

    /// The lag phase λ, the time-axis intercept of the tangent at μmax.
    ///
    /// Never negative.
    pub fn lag_time(&mut self) -> Duration {
        self.ensure_fitted().lag_time()
    }

    /// The minimum time to double in size, `ln 2 / μmax`.
    pub fn doubling_time(&mut self) -> Duration {
        self.ensure_fitted().doubling_time()
    }

    /// Standard deviations of the fitted model parameters, if they could be estimated.
    pub fn parameter_std_devs(&mut self) -> Option<ModelParameters> {
        self.ensure_fitted().std_devs
    }

    /// Summary of the fit suitable for reports.
    pub fn summary(&mut self) -> FitSummary {
        let fitted = *self.ensure_fitted();
        FitSummary::new(self.points, &fitted)
    }
}

/// Flat, serializable view of a growth curve fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub points: usize,
    pub converged: bool,
    pub lag_time_seconds: f64,
    pub growth_rate_per_second: f64,
    pub growth_rate_per_hour: f64,
    pub carrying_capacity: f64,
    pub doubling_time_seconds: f64,
    pub std_devs: Option<ModelParameters>,
}

impl FitSummary {
    pub fn new(points: usize, fitted: &FittedParameters) -> Self {
        Self {
            points,
            converged: fitted.converged,
            lag_time_seconds: fitted.lag_time().as_secs_f64(),
            growth_rate_per_second: fitted.growth_rate,
            growth_rate_per_hour: fitted.growth_rate * SECONDS_PER_HOUR,
            carrying_capacity: fitted.carrying_capacity,
            doubling_time_seconds: fitted.doubling_time().as_secs_f64(),
            std_devs: fitted.std_devs,
        }
    }
}
