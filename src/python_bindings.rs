use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::analysis::{AnalysisContext, DEFAULT_MAX_WINDOW, DEFAULT_WINDOW};
use crate::error::AnalysisError;
use crate::regression;
use crate::report::write_table;
use crate::schema::SchemaSource;
use crate::selector::ExplicitFiles;

fn to_py_err(e: AnalysisError) -> PyErr {
    match e {
        AnalysisError::Io { .. } => PyIOError::new_err(e.to_string()),
        AnalysisError::InvalidWindow(_)
        | AnalysisError::LengthMismatch { .. }
        | AnalysisError::InsufficientPoints(_)
        | AnalysisError::NonPositiveLogArgument(_)
        | AnalysisError::DegenerateFit
        | AnalysisError::Selection(_)
        | AnalysisError::Schema(_) => PyValueError::new_err(e.to_string()),
        _ => PyRuntimeError::new_err(e.to_string()),
    }
}

fn load_context(files: Vec<String>, schema: Option<&str>) -> PyResult<AnalysisContext> {
    let schema = match schema {
        Some(s) => s.parse::<SchemaSource>().map_err(to_py_err)?,
        None => SchemaSource::default(),
    };
    AnalysisContext::load(&ExplicitFiles::new(files), &schema).map_err(to_py_err)
}

/// Fit `log10(r) = a * log10(n - 1)`; returns `(a, delta)`
#[pyfunction]
fn regress(n: Vec<f64>, r: Vec<f64>) -> PyResult<(f64, f64)> {
    let fit = regression::regress(&n, &r).map_err(to_py_err)?;
    Ok((fit.slope, fit.std_error))
}

/// Sample points `{n, r, window_used}` for each trajectory file
#[pyfunction]
#[pyo3(signature = (files, window=DEFAULT_WINDOW, schema=None))]
fn sample_points(py: Python<'_>, files: Vec<String>, window: usize, schema: Option<&str>) -> PyResult<PyObject> {
    let ctx = load_context(files, schema)?;
    let points = ctx.sample_points(window).map_err(to_py_err)?;

    let py_points = PyList::empty_bound(py);
    for point in points {
        let py_dict = PyDict::new_bound(py);
        py_dict.set_item("n", point.n)?;
        py_dict.set_item("r", point.r)?;
        py_dict.set_item("window_used", point.window_used)?;
        py_points.append(py_dict)?;
    }

    Ok(py_points.into())
}

/// Slope and standard error for one window size
#[pyfunction]
#[pyo3(signature = (files, window=DEFAULT_WINDOW, schema=None))]
fn fit(files: Vec<String>, window: usize, schema: Option<&str>) -> PyResult<(f64, f64)> {
    let ctx = load_context(files, schema)?;
    let result = ctx.regress(window).map_err(to_py_err)?;
    Ok((result.slope, result.std_error))
}

/// The full table for window sizes `1..=max_window`, as text
#[pyfunction]
#[pyo3(signature = (files, max_window=DEFAULT_MAX_WINDOW, schema=None))]
fn report(files: Vec<String>, max_window: usize, schema: Option<&str>) -> PyResult<String> {
    let ctx = load_context(files, schema)?;
    let fits = ctx.window_fits(1..=max_window).map_err(to_py_err)?;

    let mut out = Vec::new();
    write_table(&mut out, &fits).map_err(|e| PyIOError::new_err(e.to_string()))?;
    String::from_utf8(out).map_err(|e| PyRuntimeError::new_err(e.to_string()))
}

/// Python module definition
#[pymodule]
fn polymer_scaling_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(regress, m)?)?;
    m.add_function(wrap_pyfunction!(sample_points, m)?)?;
    m.add_function(wrap_pyfunction!(fit, m)?)?;
    m.add_function(wrap_pyfunction!(report, m)?)?;
    m.add("__doc__", "Polymer chain scaling analysis of LAMMPS trajectories")?;
    Ok(())
}
