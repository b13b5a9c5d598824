use statrs::statistics::Statistics;

/// Slope and intercept of an ordinary least-squares line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

/// First differences of consecutive values.
pub fn differences(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Arithmetic mean, `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    Statistics::mean(values)
}

/// Population standard deviation (divisor `n`), `NaN` for an empty slice.
pub fn population_std_dev(values: &[f64]) -> f64 {
    Statistics::population_std_dev(values)
}

/// Fit `y = slope * x + intercept` by least squares.
///
/// Returns `None` when fewer than two points are given or every `x` is equal.
pub fn linear_regression(x: &[f64], y: &[f64]) -> Option<LinearFit> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }
    let x = &x[..n];
    let y = &y[..n];

    let x_mean = mean(x);
    let y_mean = mean(y);

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - x_mean;
        sxx += dx * dx;
        sxy += dx * (yi - y_mean);
    }
    if sxx <= 0.0 || !sxx.is_finite() {
        return None;
    }

    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: y_mean - slope * x_mean,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_differences() {
        assert_eq!(differences(&[1.0, 3.0, 6.0, 6.0]), vec![2.0, 3.0, 0.0]);
        assert!(differences(&[1.0]).is_empty());
        assert!(differences(&[]).is_empty());
    }

    #[test]
    fn test_mean_and_population_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_approx_eq!(mean(&values), 5.0, 1e-12);
        assert_approx_eq!(population_std_dev(&values), 2.0, 1e-12);
    }

    #[test]
    fn test_constant_values_have_zero_spread() {
        assert_approx_eq!(population_std_dev(&[3.0, 3.0, 3.0]), 0.0, 1e-12);
    }

    #[test]
    fn test_linear_regression_exact_line() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v - 2.0).collect();
        let fit = linear_regression(&x, &y).unwrap();
        assert_approx_eq!(fit.slope, 3.0, 1e-12);
        assert_approx_eq!(fit.intercept, -2.0, 1e-12);
    }

    #[test]
    fn test_linear_regression_noisy_line() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.1, 3.9, 6.2, 7.8, 10.1];
        let fit = linear_regression(&x, &y).unwrap();
        assert_approx_eq!(fit.slope, 1.99, 1e-9);
        assert_approx_eq!(fit.intercept, 0.05, 1e-9);
    }

    #[test]
    fn test_linear_regression_degenerate() {
        assert!(linear_regression(&[1.0], &[1.0]).is_none());
        assert!(linear_regression(&[2.0, 2.0], &[1.0, 5.0]).is_none());
    }
}
