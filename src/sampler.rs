use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::structure::{Coordinate, Snapshot};
use crate::trajectory::Trajectory;

/// Chain length paired with its window-averaged squared end-to-end distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub n: usize,
    pub r: f64,
    /// Snapshots actually averaged (smaller than the requested window when the trajectory is short)
    pub window_used: usize,
}

/// Vector from the first to the last particle of a snapshot
pub fn end_to_end_vector(snapshot: &Snapshot) -> Result<Coordinate> {
    let positions = snapshot
        .positions
        .as_ref()
        .ok_or(AnalysisError::MissingPositions { step: snapshot.step })?;

    match (positions.first(), positions.last()) {
        (Some(first), Some(last)) => Ok(*last - *first),
        _ => Err(AnalysisError::EmptySnapshot { step: snapshot.step }),
    }
}

/// Average squared end-to-end distance over the last `window` snapshots.
///
/// Snapshots are ordered by step first, so the input order does not matter.
/// A trajectory shorter than `window` is averaged over all of its snapshots.
/// The chain length is the particle count of the earliest snapshot.
pub fn sample_trajectory<T: Trajectory + ?Sized>(trajectory: &T, window: usize) -> Result<SamplePoint> {
    if window == 0 {
        return Err(AnalysisError::InvalidWindow(window));
    }

    let mut sorted: Vec<&Snapshot> = trajectory.snapshots().iter().collect();
    if sorted.is_empty() {
        let source = trajectory.source().map(|p| p.to_path_buf()).unwrap_or_default();
        return Err(AnalysisError::EmptyTrajectory(source));
    }
    sorted.sort_by_key(|s| s.step);

    let n = sorted[0].particle_count;
    if sorted.iter().any(|s| s.particle_count != n) {
        warn!(
            "Particle count changes within trajectory {}; using {} from step {}",
            describe(trajectory),
            n,
            sorted[0].step
        );
    }

    let window_used = window.min(sorted.len());
    if window_used < window {
        debug!(
            "Trajectory {} has {} snapshots, fewer than window {}",
            describe(trajectory),
            sorted.len(),
            window
        );
    }

    let selected = &sorted[sorted.len() - window_used..];
    let mut total = 0.0;
    for snapshot in selected {
        total += end_to_end_vector(snapshot)?.norm_squared();
    }

    Ok(SamplePoint {
        n,
        r: total / window_used as f64,
        window_used,
    })
}

fn describe<T: Trajectory + ?Sized>(trajectory: &T) -> String {
    trajectory
        .source()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<memory>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(step: i64, end: f64) -> Snapshot {
        Snapshot::from_positions(
            step,
            vec![
                Coordinate::new(0.0, 0.0, 0.0),
                Coordinate::new(0.5, 0.5, 0.0),
                Coordinate::new(end, 0.0, 0.0),
            ],
        )
    }

    #[test]
    fn test_window_averages_last_snapshots() {
        // squared distances: 1, 4, 9 at steps 0, 10, 20
        let traj = vec![chain(0, 1.0), chain(10, 2.0), chain(20, 3.0)];
        let point = sample_trajectory(&traj, 2).unwrap();
        assert_eq!(point.n, 3);
        assert_eq!(point.r, 6.5);
        assert_eq!(point.window_used, 2);
    }

    #[test]
    fn test_snapshot_order_does_not_matter() {
        let ordered = vec![chain(0, 1.0), chain(10, 2.0), chain(20, 3.0)];
        let shuffled = vec![chain(20, 3.0), chain(0, 1.0), chain(10, 2.0)];
        for window in 1..=3 {
            assert_eq!(
                sample_trajectory(&ordered, window).unwrap(),
                sample_trajectory(&shuffled, window).unwrap()
            );
        }
    }

    #[test]
    fn test_short_trajectory_clamps_window() {
        let traj = vec![chain(0, 1.0), chain(10, 3.0)];
        let point = sample_trajectory(&traj, 50).unwrap();
        assert_eq!(point.window_used, 2);
        assert_eq!(point.r, 5.0);
    }

    #[test]
    fn test_end_to_end_uses_first_and_last_particle() {
        let snap = Snapshot::from_positions(
            0,
            vec![Coordinate::new(1.0, 1.0, 1.0), Coordinate::new(9.0, 9.0, 9.0), Coordinate::new(2.0, 3.0, 4.0)],
        );
        assert_eq!(end_to_end_vector(&snap).unwrap(), Coordinate::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_errors() {
        let traj = vec![chain(0, 1.0)];
        assert!(matches!(sample_trajectory(&traj, 0), Err(AnalysisError::InvalidWindow(0))));

        let empty: Vec<Snapshot> = Vec::new();
        assert!(matches!(sample_trajectory(&empty, 1), Err(AnalysisError::EmptyTrajectory(_))));

        let no_positions = vec![Snapshot { step: 4, particle_count: 2, ..Default::default() }];
        assert!(matches!(
            sample_trajectory(&no_positions, 1),
            Err(AnalysisError::MissingPositions { step: 4 })
        ));

        let no_particles = vec![Snapshot::from_positions(7, Vec::new())];
        assert!(matches!(
            sample_trajectory(&no_particles, 1),
            Err(AnalysisError::EmptySnapshot { step: 7 })
        ));
    }
}
