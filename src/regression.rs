use serde::Serialize;

use crate::error::{AnalysisError, Result};

/// Slope of `log10(r) = a * log10(n - 1)` and its standard error
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegressionResult {
    pub slope: f64,
    pub std_error: f64,
}

impl RegressionResult {
    /// Flory exponent: `r` is a squared distance, so the size exponent is half the slope
    pub fn exponent(&self) -> f64 {
        self.slope / 2.0
    }

    pub fn exponent_error(&self) -> f64 {
        self.std_error / 2.0
    }
}

/// Fit `log10(r) = a * log10(n - 1)` through the origin.
///
/// The residual variance divides by `len - 2`, so at least three points are
/// required even though only the slope is fitted.
///
/// # Arguments
/// * `n` - Chain lengths, each greater than 1
/// * `r` - Mean squared end-to-end distances, each positive
///
/// # Returns
/// Slope and standard error, or a domain error instead of NaN/Inf
pub fn regress(n: &[f64], r: &[f64]) -> Result<RegressionResult> {
    if n.len() != r.len() {
        return Err(AnalysisError::LengthMismatch { n: n.len(), r: r.len() });
    }
    if r.len() <= 2 {
        return Err(AnalysisError::InsufficientPoints(r.len()));
    }

    let mut x = Vec::with_capacity(n.len());
    let mut y = Vec::with_capacity(r.len());
    for (&ni, &ri) in n.iter().zip(r) {
        if !ni.is_finite() || ni <= 1.0 {
            return Err(AnalysisError::NonPositiveLogArgument(format!("n - 1 = {} (n = {})", ni - 1.0, ni)));
        }
        if !ri.is_finite() || ri <= 0.0 {
            return Err(AnalysisError::NonPositiveLogArgument(format!("r = {}", ri)));
        }
        x.push((ni - 1.0).log10());
        y.push(ri.log10());
    }

    let sxx: f64 = x.iter().map(|xi| xi * xi).sum();
    if sxx == 0.0 {
        return Err(AnalysisError::DegenerateFit);
    }
    let sxy: f64 = x.iter().zip(&y).map(|(xi, yi)| xi * yi).sum();
    let slope = sxy / sxx;

    let residual: f64 = x
        .iter()
        .zip(&y)
        .map(|(xi, yi)| (yi - slope * xi).powi(2))
        .sum();
    let dy = residual / (y.len() - 2) as f64;
    let std_error = (dy / sxx).sqrt();

    Ok(RegressionResult { slope, std_error })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_power_law() {
        let exponent = 1.176;
        let n = [2.0, 3.0, 5.0, 9.0];
        let r: Vec<f64> = n.iter().map(|ni: &f64| (ni - 1.0).powf(exponent)).collect();

        let fit = regress(&n, &r).unwrap();
        assert!((fit.slope - exponent).abs() < 1e-12);
        assert!(fit.std_error.abs() < 1e-7);
        assert!((fit.exponent() - exponent / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_noisy_fit_matches_hand_computation() {
        // x = log10(n - 1) = [1, 2, 3], y = [2, 4, 7]
        let n = [11.0, 101.0, 1001.0];
        let r = [100.0, 1e4, 1e7];
        let fit = regress(&n, &r).unwrap();

        // a = (2 + 8 + 21) / 14, residuals over 1 degree of freedom
        let a: f64 = 31.0 / 14.0;
        let rss = (2.0 - a).powi(2) + (4.0 - 2.0 * a).powi(2) + (7.0 - 3.0 * a).powi(2);
        assert!((fit.slope - a).abs() < 1e-9);
        assert!((fit.std_error - (rss / 14.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_two_points_is_error() {
        let result = regress(&[3.0, 5.0], &[2.0, 4.0]);
        assert!(matches!(result, Err(AnalysisError::InsufficientPoints(2))));
    }

    #[test]
    fn test_domain_errors() {
        assert!(matches!(
            regress(&[1.0, 3.0, 5.0], &[1.0, 2.0, 3.0]),
            Err(AnalysisError::NonPositiveLogArgument(_))
        ));
        assert!(matches!(
            regress(&[2.0, 3.0, 5.0], &[1.0, 0.0, 3.0]),
            Err(AnalysisError::NonPositiveLogArgument(_))
        ));
        assert!(matches!(
            regress(&[2.0, 3.0, 5.0], &[1.0, f64::NAN, 3.0]),
            Err(AnalysisError::NonPositiveLogArgument(_))
        ));
        assert!(matches!(
            regress(&[2.0, 3.0], &[1.0, 2.0, 3.0]),
            Err(AnalysisError::LengthMismatch { n: 2, r: 3 })
        ));
        assert!(matches!(
            regress(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]),
            Err(AnalysisError::DegenerateFit)
        ));
    }
}
