//! Numerical solvers used by curve fitting.

pub mod levenberg_marquardt;

pub use levenberg_marquardt::{
    LeastSquaresSolution, LevenbergMarquardt, LevenbergMarquardtConfig, SolverError, Termination,
};
