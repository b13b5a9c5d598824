//! Levenberg-Marquardt solver for small non-linear least-squares problems.
//!
//! We minimize `Σ r_i(p)²` for a residual function `r` with a handful of
//! parameters:
//!
//! - the Jacobian is estimated by forward differences
//! - each step solves `(JᵀJ + λ·D) δ = -Jᵀr` by Cholesky, where `D` is the
//!   diagonal of `JᵀJ` (Marquardt scaling, so parameters of very different
//!   magnitude are damped evenly)
//! - λ shrinks tenfold after an accepted step and grows tenfold after a
//!   rejected one
//!
//! Every residual evaluation, including the ones spent on the Jacobian, counts
//! against the evaluation budget.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Damping above which no downhill step is considered reachable.
const MAX_LAMBDA: f64 = 1e16;
const MIN_LAMBDA: f64 = 1e-15;

/// Solver settings.
#[derive(Debug, Clone)]
pub struct LevenbergMarquardtConfig {
    /// Maximum number of residual evaluations
    pub max_evaluations: usize,
    /// Relative reduction of the sum of squares treated as converged
    pub ftol: f64,
    /// Relative step size treated as converged
    pub xtol: f64,
    /// Gradient magnitude (max norm) treated as converged
    pub gtol: f64,
    /// Initial damping factor
    pub initial_lambda: f64,
}

impl Default for LevenbergMarquardtConfig {
    fn default() -> Self {
        Self {
            max_evaluations: 1000,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            gtol: 1.49012e-8,
            initial_lambda: 1e-3,
        }
    }
}

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Residuals are exactly zero
    ZeroResidual,
    /// Gradient fell below `gtol`
    Gradient,
    /// Relative reduction in the sum of squares fell below `ftol`
    CostReduction,
    /// Relative step fell below `xtol`
    StepSize,
    /// No downhill step exists even under maximal damping
    Stalled,
}

/// Reasons the solver could not produce a solution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("invalid problem: {0}")]
    InvalidProblem(String),

    #[error("residuals are not finite at the starting point")]
    NonFiniteStart,

    #[error("number of residual evaluations reached the limit of {0}")]
    EvaluationLimit(usize),
}

/// A converged least-squares solution.
#[derive(Debug, Clone)]
pub struct LeastSquaresSolution {
    pub parameters: DVector<f64>,
    pub residuals: DVector<f64>,
    /// Jacobian of the residuals at `parameters`
    pub jacobian: DMatrix<f64>,
    pub sum_of_squares: f64,
    pub evaluations: usize,
    pub iterations: usize,
    pub termination: Termination,
}

/// Residual function wrapper that enforces the evaluation budget.
struct Objective<F> {
    residuals: F,
    evaluations: usize,
    budget: usize,
}

impl<F> Objective<F>
where
    F: FnMut(&DVector<f64>) -> DVector<f64>,
{
    fn eval(&mut self, x: &DVector<f64>) -> Result<DVector<f64>, SolverError> {
        if self.evaluations >= self.budget {
            return Err(SolverError::EvaluationLimit(self.budget));
        }
        Ok(self.eval_unbounded(x))
    }

    fn eval_unbounded(&mut self, x: &DVector<f64>) -> DVector<f64> {
        self.evaluations += 1;
        (self.residuals)(x)
    }

    fn jacobian(
        &mut self,
        x: &DVector<f64>,
        r: &DVector<f64>,
        bounded: bool,
    ) -> Result<DMatrix<f64>, SolverError> {
        let mut jac = DMatrix::<f64>::zeros(r.len(), x.len());
        let sqrt_eps = f64::EPSILON.sqrt();

        for j in 0..x.len() {
            let mut h = sqrt_eps * x[j].abs();
            if h == 0.0 {
                h = sqrt_eps;
            }
            let mut shifted = x.clone();
            shifted[j] += h;
            // Actual step after rounding
            let h = shifted[j] - x[j];

            let r_shifted = if bounded {
                self.eval(&shifted)?
            } else {
                self.eval_unbounded(&shifted)
            };
            let column = (r_shifted - r) / h;
            jac.set_column(j, &column);
        }

        Ok(jac)
    }
}

/// Levenberg-Marquardt minimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: LevenbergMarquardtConfig,
}

impl LevenbergMarquardt {
    pub fn new(config: LevenbergMarquardtConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LevenbergMarquardtConfig {
        &self.config
    }

    /// Minimize the sum of squared residuals starting from `initial`.
    pub fn minimize<F>(
        &self,
        residuals: F,
        initial: DVector<f64>,
    ) -> Result<LeastSquaresSolution, SolverError>
    where
        F: FnMut(&DVector<f64>) -> DVector<f64>,
    {
        if initial.is_empty() {
            return Err(SolverError::InvalidProblem(
                "at least one parameter is required".to_string(),
            ));
        }
        if initial.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::InvalidProblem(
                "initial parameters must be finite".to_string(),
            ));
        }

        let mut objective = Objective {
            residuals,
            evaluations: 0,
            budget: self.config.max_evaluations,
        };

        let mut x = initial;
        let mut r = objective.eval(&x)?;
        if r.is_empty() {
            return Err(SolverError::InvalidProblem(
                "at least one residual is required".to_string(),
            ));
        }
        let mut cost = r.norm_squared();
        if !cost.is_finite() {
            return Err(SolverError::NonFiniteStart);
        }

        let mut lambda = self.config.initial_lambda;
        let mut iterations = 0;

        let termination = 'outer: loop {
            if cost == 0.0 {
                break Termination::ZeroResidual;
            }

            let jac = objective.jacobian(&x, &r, true)?;
            let gradient = jac.tr_mul(&r);
            if gradient.amax() <= self.config.gtol {
                break Termination::Gradient;
            }

            let jtj = jac.tr_mul(&jac);
            let scale = jtj.diagonal().map(|d| if d > 0.0 { d } else { 1.0 });
            let neg_gradient = -gradient;
            iterations += 1;

            loop {
                let mut damped = jtj.clone();
                for i in 0..damped.nrows() {
                    damped[(i, i)] += lambda * scale[i];
                }

                let Some(step) = damped.cholesky().map(|c| c.solve(&neg_gradient)) else {
                    lambda *= 10.0;
                    if lambda > MAX_LAMBDA {
                        break 'outer Termination::Stalled;
                    }
                    continue;
                };

                let x_norm = x.norm();
                let step_norm = step.norm();
                let candidate = &x + &step;
                let r_candidate = objective.eval(&candidate)?;
                let cost_candidate = r_candidate.norm_squared();

                if cost_candidate.is_finite() && cost_candidate < cost {
                    let reduction = cost - cost_candidate;
                    let previous_cost = cost;
                    x = candidate;
                    r = r_candidate;
                    cost = cost_candidate;
                    lambda = (lambda / 10.0).max(MIN_LAMBDA);

                    if reduction <= self.config.ftol * previous_cost {
                        break 'outer Termination::CostReduction;
                    }
                    if step_norm <= self.config.xtol * (x_norm + self.config.xtol) {
                        break 'outer Termination::StepSize;
                    }
                    break;
                }

                if step_norm <= self.config.xtol * (x_norm + self.config.xtol) {
                    break 'outer Termination::StepSize;
                }
                lambda *= 10.0;
                if lambda > MAX_LAMBDA {
                    break 'outer Termination::Stalled;
                }
            }
        };

        let jacobian = objective.jacobian(&x, &r, false)?;

        tracing::debug!(
            ?termination,
            iterations,
            evaluations = objective.evaluations,
            sum_of_squares = cost,
            "least-squares solver finished"
        );

        Ok(LeastSquaresSolution {
            parameters: x,
            residuals: r,
            jacobian,
            sum_of_squares: cost,
            evaluations: objective.evaluations,
            iterations,
            termination,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn exponential_problem() -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..20).map(|i| i as f64 * 0.25).collect();
        let y: Vec<f64> = x.iter().map(|t| 2.5 * (-1.3 * t).exp() + 0.5).collect();
        (x, y)
    }

    #[test]
    fn test_linear_problem_solved() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let solver = LevenbergMarquardt::default();
        let solution = solver
            .minimize(
                |p: &DVector<f64>| {
                    DVector::from_iterator(4, x.iter().zip(&y).map(|(xi, yi)| p[0] + p[1] * xi - yi))
                },
                DVector::from_vec(vec![0.0, 0.0]),
            )
            .unwrap();
        assert_approx_eq!(solution.parameters[0], 1.0, 1e-6);
        assert_approx_eq!(solution.parameters[1], 2.0, 1e-6);
        assert!(solution.sum_of_squares < 1e-10);
    }

    #[test]
    fn test_exponential_decay_recovered() {
        let (x, y) = exponential_problem();
        let solver = LevenbergMarquardt::default();
        let solution = solver
            .minimize(
                |p: &DVector<f64>| {
                    DVector::from_iterator(
                        x.len(),
                        x.iter()
                            .zip(&y)
                            .map(|(t, yi)| p[0] * (-p[1] * t).exp() + p[2] - yi),
                    )
                },
                DVector::from_vec(vec![1.0, 0.5, 0.0]),
            )
            .unwrap();
        assert_approx_eq!(solution.parameters[0], 2.5, 1e-5);
        assert_approx_eq!(solution.parameters[1], 1.3, 1e-5);
        assert_approx_eq!(solution.parameters[2], 0.5, 1e-5);
        assert_eq!(solution.jacobian.shape(), (20, 3));
    }

    #[test]
    fn test_evaluation_limit_reported() {
        let (x, y) = exponential_problem();
        let solver = LevenbergMarquardt::new(LevenbergMarquardtConfig {
            max_evaluations: 3,
            ..Default::default()
        });
        let err = solver
            .minimize(
                |p: &DVector<f64>| {
                    DVector::from_iterator(
                        x.len(),
                        x.iter()
                            .zip(&y)
                            .map(|(t, yi)| p[0] * (-p[1] * t).exp() + p[2] - yi),
                    )
                },
                DVector::from_vec(vec![1.0, 0.5, 0.0]),
            )
            .unwrap_err();
        assert_eq!(err, SolverError::EvaluationLimit(3));
    }

    #[test]
    fn test_non_finite_start_rejected() {
        let solver = LevenbergMarquardt::default();
        let err = solver
            .minimize(
                |_: &DVector<f64>| DVector::from_vec(vec![f64::NAN, 1.0]),
                DVector::from_vec(vec![1.0]),
            )
            .unwrap_err();
        assert_eq!(err, SolverError::NonFiniteStart);
    }

    #[test]
    fn test_invalid_initial_parameters_rejected() {
        let solver = LevenbergMarquardt::default();
        let err = solver
            .minimize(
                |p: &DVector<f64>| p.clone(),
                DVector::from_vec(vec![f64::INFINITY]),
            )
            .unwrap_err();
        assert!(matches!(err, SolverError::InvalidProblem(_)));

        let err = solver
            .minimize(|p: &DVector<f64>| p.clone(), DVector::from_vec(vec![]))
            .unwrap_err();
        assert!(matches!(err, SolverError::InvalidProblem(_)));
    }

    #[test]
    fn test_exact_start_terminates_immediately() {
        let solver = LevenbergMarquardt::default();
        let solution = solver
            .minimize(
                |p: &DVector<f64>| DVector::from_vec(vec![p[0] - 3.0]),
                DVector::from_vec(vec![3.0]),
            )
            .unwrap();
        assert_eq!(solution.termination, Termination::ZeroResidual);
        assert_eq!(solution.iterations, 0);
    }

    #[test]
    fn test_insensitive_parameter_does_not_break_solver() {
        // p[1] has no effect on the residuals; its Jacobian column is zero
        let solver = LevenbergMarquardt::default();
        let solution = solver
            .minimize(
                |p: &DVector<f64>| DVector::from_vec(vec![p[0] - 1.0, p[0] - 2.0]),
                DVector::from_vec(vec![0.0, 5.0]),
            )
            .unwrap();
        assert_approx_eq!(solution.parameters[0], 1.5, 1e-6);
        assert_eq!(solution.parameters[1], 5.0);
    }
}
