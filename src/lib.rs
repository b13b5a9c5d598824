pub mod analysis;
pub mod config;
pub mod error;
pub mod io;
pub mod models;
pub mod report;
pub mod solver;

pub use analysis::{FitSummary, GrowthCurve};
pub use config::FitConfig;
pub use error::GrowthError;
pub use models::{FittedParameters, GrowthSeries, GrowthSource, ModelParameters};
