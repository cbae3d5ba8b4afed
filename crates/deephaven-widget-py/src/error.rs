//! Error types for Python bindings.

use deephaven_widget::WidgetError;
use pyo3::exceptions::{PyException, PyValueError};
use pyo3::prelude::*;

pyo3::create_exception!(deephaven_ipywidgets, DeephavenWidgetError, PyException);

/// Convert widget errors to Python exceptions.
///
/// Caller mistakes surface as `ValueError`, everything else as
/// `DeephavenWidgetError`.
pub fn to_py_err(err: WidgetError) -> PyErr {
    if err.is_configuration() {
        PyValueError::new_err(err.to_string())
    } else {
        DeephavenWidgetError::new_err(err.to_string())
    }
}
