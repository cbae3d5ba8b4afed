//! Python bindings for the Deephaven console widget.
//!
//! Provides:
//! - `DeephavenWidget`: displays a Deephaven table, figure or remote table
//! - `shutdown_widgets()`: marks every live widget inactive; registered with
//!   `atexit` when the module is imported
//! - `classify()`: the iframe route for a type identity

use pyo3::prelude::*;

mod error;
mod host;
mod widget;

use error::DeephavenWidgetError;
use widget::PyDeephavenWidget;

/// Mark every live widget inactive. Returns how many were notified.
#[pyfunction]
fn shutdown_widgets() -> usize {
    widget::shutdown_hooks().notify_all()
}

/// Iframe route (`table`, `chart` or `widget`) for a type identity such as
/// `deephaven.table.Table`.
#[pyfunction]
fn classify(type_identity: &str) -> &'static str {
    deephaven_widget::classify(type_identity).route()
}

#[pymodule]
fn deephaven_ipywidgets(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyDeephavenWidget>()?;
    m.add_function(wrap_pyfunction!(shutdown_widgets, m)?)?;
    m.add_function(wrap_pyfunction!(classify, m)?)?;

    m.add(
        "DeephavenWidgetError",
        m.py().get_type::<DeephavenWidgetError>(),
    )?;

    let atexit = PyModule::import(m.py(), "atexit")?;
    atexit.call_method1("register", (m.getattr("shutdown_widgets")?,))?;

    Ok(())
}
