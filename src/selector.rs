use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};

/// Default extension of LAMMPS trajectory dumps
pub const TRAJECTORY_EXTENSION: &str = "lammpstrj";

/// Source of the trajectory files to analyze
pub trait FileSelector {
    /// Return the chosen files. Choosing nothing is an error.
    fn select_input_files(&self) -> Result<Vec<PathBuf>>;
}

/// Literal list of paths, e.g. from the command line
#[derive(Debug, Clone, Default)]
pub struct ExplicitFiles {
    paths: Vec<PathBuf>,
}

impl ExplicitFiles {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            paths: paths.into_iter().map(|p| p.as_ref().to_path_buf()).collect(),
        }
    }
}

impl FileSelector for ExplicitFiles {
    fn select_input_files(&self) -> Result<Vec<PathBuf>> {
        if self.paths.is_empty() {
            return Err(AnalysisError::Selection("no trajectory files given".to_string()));
        }
        Ok(self.paths.clone())
    }
}

/// Every file in a directory with a given extension, sorted by path
#[derive(Debug, Clone)]
pub struct DirectoryScan {
    dir: PathBuf,
    extension: String,
}

impl DirectoryScan {
    pub fn new(dir: impl AsRef<Path>, extension: impl Into<String>) -> Self {
        let extension: String = extension.into();
        Self {
            dir: dir.as_ref().to_path_buf(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }
}

impl FileSelector for DirectoryScan {
    fn select_input_files(&self) -> Result<Vec<PathBuf>> {
        let io_err = |source| AnalysisError::Io {
            path: self.dir.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let matches = path.extension().and_then(|e| e.to_str()) == Some(self.extension.as_str());
            if matches && path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        if files.is_empty() {
            return Err(AnalysisError::Selection(format!(
                "no *.{} files in {}",
                self.extension,
                self.dir.display()
            )));
        }
        Ok(files)
    }
}

/// Explicit files first, then any directory scan results
pub struct CombinedSelection {
    pub explicit: ExplicitFiles,
    pub scan: Option<DirectoryScan>,
}

impl FileSelector for CombinedSelection {
    fn select_input_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = self.explicit.paths.clone();
        if let Some(scan) = &self.scan {
            files.extend(scan.select_input_files()?);
        }
        if files.is_empty() {
            return Err(AnalysisError::Selection(
                "pass trajectory files or --dir with matching files".to_string(),
            ));
        }
        Ok(files)
    }
}
