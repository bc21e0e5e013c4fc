use std::ops::RangeInclusive;

use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use serde::Serialize;

use crate::error::Result;
use crate::regression::{regress, RegressionResult};
use crate::sampler::{sample_trajectory, SamplePoint};
use crate::schema::SchemaSource;
use crate::selector::FileSelector;
use crate::trajectory::{DumpTrajectory, Trajectory};

/// Window size used when a single fit is requested
pub const DEFAULT_WINDOW: usize = 5;

/// Largest window size of the standard report
pub const DEFAULT_MAX_WINDOW: usize = 150;

/// Regression result for one window size
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowFit {
    pub window: usize,
    pub slope: f64,
    pub std_error: f64,
    pub exponent: f64,
    pub exponent_error: f64,
}

impl WindowFit {
    pub fn new(window: usize, fit: RegressionResult) -> Self {
        Self {
            window,
            slope: fit.slope,
            std_error: fit.std_error,
            exponent: fit.exponent(),
            exponent_error: fit.exponent_error(),
        }
    }
}

/// Immutable set of loaded trajectories, one per chain length
pub struct AnalysisContext<T: Trajectory = DumpTrajectory> {
    trajectories: Vec<T>,
}

impl AnalysisContext<DumpTrajectory> {
    /// Select the input files and read every one of them.
    ///
    /// The first file that fails to load aborts the whole run.
    pub fn load(selector: &dyn FileSelector, schema: &SchemaSource) -> Result<Self> {
        let files = selector.select_input_files()?;
        info!("Loading {} trajectory files", files.len());

        let pb = progress_bar(files.len(), "files");
        let mut trajectories = Vec::with_capacity(files.len());
        for path in &files {
            pb.set_message(path.display().to_string());
            trajectories.push(DumpTrajectory::read(path, schema)?);
            pb.inc(1);
        }
        pb.finish_and_clear();

        info!("Loaded {} trajectories", trajectories.len());
        Ok(Self { trajectories })
    }
}

impl<T: Trajectory> AnalysisContext<T> {
    pub fn from_trajectories(trajectories: Vec<T>) -> Self {
        Self { trajectories }
    }

    /// One sample point per trajectory, in load order
    pub fn sample_points(&self, window: usize) -> Result<Vec<SamplePoint>> {
        self.trajectories
            .iter()
            .map(|t| sample_trajectory(t, window))
            .collect()
    }

    /// Sample every trajectory with `window` and fit the scaling slope
    pub fn regress(&self, window: usize) -> Result<RegressionResult> {
        let points = self.sample_points(window)?;
        regress_points(&points)
    }

    /// Fit every window size in `windows`, recomputing from the loaded set each time
    pub fn window_fits(&self, windows: RangeInclusive<usize>) -> Result<Vec<WindowFit>> {
        let pb = progress_bar(windows.clone().count(), "windows");
        let mut fits = Vec::new();
        for window in windows {
            fits.push(WindowFit::new(window, self.regress(window)?));
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(fits)
    }
}

/// Fit sample points that were computed earlier or loaded from CSV
pub fn regress_points(points: &[SamplePoint]) -> Result<RegressionResult> {
    let n: Vec<f64> = points.iter().map(|p| p.n as f64).collect();
    let r: Vec<f64> = points.iter().map(|p| p.r).collect();
    regress(&n, &r)
}

fn progress_bar(len: usize, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    let template = format!(
        "{{spinner:.green}} [{{elapsed_precise}}] [{{wide_bar:.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
        unit
    );
    let style = ProgressStyle::default_bar()
        .template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::structure::{Coordinate, Snapshot};

    /// Straight chain of `n` particles whose end-to-end squared distance is `r2`
    fn straight_chain(n: usize, r2: f64, steps: &[i64]) -> Vec<Snapshot> {
        let length = r2.sqrt();
        steps
            .iter()
            .map(|&step| {
                let positions = (0..n)
                    .map(|i| Coordinate::new(length * i as f64 / (n - 1) as f64, 0.0, 0.0))
                    .collect();
                Snapshot::from_positions(step, positions)
            })
            .collect()
    }

    fn power_law_context(exponent: f64) -> AnalysisContext<Vec<Snapshot>> {
        let trajectories = [3usize, 5, 9, 17]
            .iter()
            .map(|&n| straight_chain(n, ((n - 1) as f64).powf(exponent), &[0, 1, 2]))
            .collect();
        AnalysisContext::from_trajectories(trajectories)
    }

    #[test]
    fn test_context_recovers_exponent() {
        let ctx = power_law_context(1.2);
        let points = ctx.sample_points(2).unwrap();
        assert_eq!(points.iter().map(|p| p.n).collect::<Vec<_>>(), vec![3, 5, 9, 17]);

        let fit = ctx.regress(DEFAULT_WINDOW).unwrap();
        assert!((fit.slope - 1.2).abs() < 1e-9);
        assert!(fit.std_error < 1e-6);
    }

    #[test]
    fn test_window_fits_cover_range() {
        let ctx = power_law_context(1.0);
        let fits = ctx.window_fits(1..=4).unwrap();
        assert_eq!(fits.len(), 4);
        assert_eq!(fits[0].window, 1);
        assert_eq!(fits[3].window, 4);
        assert!((fits[2].exponent - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_two_trajectories_cannot_be_fitted() {
        let ctx = AnalysisContext::from_trajectories(vec![
            straight_chain(3, 4.0, &[0]),
            straight_chain(5, 9.0, &[0]),
        ]);
        assert!(matches!(ctx.regress(1), Err(AnalysisError::InsufficientPoints(2))));
    }
}
