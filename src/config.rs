use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::GrowthError;

/// Default sliding-window size used when estimating the maximum growth rate.
pub const DEFAULT_WINDOW: usize = 10;

/// Default tolerance for the least-squares solver (`sqrt` of machine epsilon).
pub const DEFAULT_TOLERANCE: f64 = 1.49012e-8;

/// Tunables for parameter estimation and curve fitting.
///
/// Every field has a default, so a TOML file only needs to list the values
/// it overrides:
///
/// ```
/// use colony_growth::FitConfig;
///
/// let config = FitConfig::from_toml_str("window = 6").unwrap();
/// assert_eq!(config.window, 6);
/// assert_eq!(config.max_evaluations, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Number of consecutive points in each sliding regression window
    pub window: usize,
    /// Budget of model evaluations for the solver; 0 means `200 * (parameters + 1)`
    pub max_evaluations: usize,
    /// Relative reduction in the sum of squares below which the fit has converged
    pub ftol: f64,
    /// Relative change in the parameters below which the fit has converged
    pub xtol: f64,
    /// Largest gradient component at which the fit has converged
    pub gtol: f64,
    /// Starting damping factor for Levenberg-Marquardt
    pub initial_lambda: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            max_evaluations: 0,
            ftol: DEFAULT_TOLERANCE,
            xtol: DEFAULT_TOLERANCE,
            gtol: DEFAULT_TOLERANCE,
            initial_lambda: 1e-3,
        }
    }
}

impl FitConfig {
    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self, GrowthError> {
        let config: FitConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration from a TOML file and validate it.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, GrowthError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Check that the settings describe a usable fit.
    pub fn validate(&self) -> Result<(), GrowthError> {
        if self.window < 2 {
            return Err(GrowthError::ValidationError(format!(
                "window must be at least 2, got {}",
                self.window
            )));
        }
        for (name, value) in [
            ("ftol", self.ftol),
            ("xtol", self.xtol),
            ("gtol", self.gtol),
            ("initial_lambda", self.initial_lambda),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GrowthError::ValidationError(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Effective evaluation budget for a model with `n_params` parameters.
    pub fn evaluation_budget(&self, n_params: usize) -> usize {
        if self.max_evaluations == 0 {
            200 * (n_params + 1)
        } else {
            self.max_evaluations
        }
    }
}
