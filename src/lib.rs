pub mod analysis;
pub mod error;
pub mod export;
pub mod regression;
pub mod report;
pub mod sampler;
pub mod schema;
pub mod selector;
pub mod structure;
pub mod trajectory;

#[cfg(feature = "python")]
pub mod python_bindings;

// Re-export commonly used types and traits
pub use analysis::{regress_points, AnalysisContext, WindowFit, DEFAULT_MAX_WINDOW, DEFAULT_WINDOW};
pub use error::{AnalysisError, Result};
pub use export::{load_points_from_csv, save_fits_to_csv, save_points_to_csv, write_points_csv};
pub use regression::{regress, RegressionResult};
pub use report::{format_row, write_table};
pub use sampler::{end_to_end_vector, sample_trajectory, SamplePoint};
pub use schema::{DumpSchema, SchemaSource};
pub use selector::{CombinedSelection, DirectoryScan, ExplicitFiles, FileSelector, TRAJECTORY_EXTENSION};
pub use structure::{Coordinate, SimulationBox, Snapshot};
pub use trajectory::{read_dump, DumpTrajectory, Trajectory};
