use std::io::Write;
use std::path::Path;

use crate::analysis::WindowFit;
use crate::error::{AnalysisError, Result};
use crate::sampler::SamplePoint;

fn csv_error(path: &Path, e: impl std::fmt::Display) -> AnalysisError {
    AnalysisError::Csv {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Write sample points as `n,r,window_used` rows
pub fn write_points_csv<W: Write>(out: W, points: &[SamplePoint], label: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for point in points {
        writer.serialize(point).map_err(|e| csv_error(label, e))?;
    }
    writer.flush().map_err(|e| csv_error(label, e))?;
    Ok(())
}

/// Save sample points to a CSV file
pub fn save_points_to_csv(points: &[SamplePoint], output_path: &Path) -> Result<()> {
    let file = std::fs::File::create(output_path).map_err(|source| AnalysisError::Io {
        path: output_path.to_path_buf(),
        source,
    })?;
    write_points_csv(file, points, output_path)
}

/// Load sample points from a CSV file written by `save_points_to_csv`
pub fn load_points_from_csv(csv_path: &Path) -> Result<Vec<SamplePoint>> {
    let mut reader = csv::Reader::from_path(csv_path).map_err(|e| csv_error(csv_path, e))?;

    let mut points = Vec::new();
    for result in reader.deserialize() {
        let point: SamplePoint = result.map_err(|e| csv_error(csv_path, e))?;
        points.push(point);
    }

    Ok(points)
}

/// Save per-window fits as `window,slope,std_error,exponent,exponent_error` rows
pub fn save_fits_to_csv(fits: &[WindowFit], output_path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path).map_err(|e| csv_error(output_path, e))?;
    for fit in fits {
        writer.serialize(fit).map_err(|e| csv_error(output_path, e))?;
    }
    writer.flush().map_err(|e| csv_error(output_path, e))?;
    Ok(())
}
