//! `DeephavenWidget` Python class.

use std::sync::{Arc, OnceLock};

use deephaven_widget::{
    DeephavenWidget, DisplayTarget, Settings, ShutdownHooks, WidgetError, WidgetHost,
    WidgetOptions,
};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::error::to_py_err;
use crate::host::{
    json_to_py, new_dom_widget, ColabProxy, EmbeddedServer, MainNamespace, PyDisplayable,
    PySession, TraitView,
};

/// Widgets to mark inactive when the interpreter exits.
pub fn shutdown_hooks() -> &'static ShutdownHooks {
    static HOOKS: OnceLock<ShutdownHooks> = OnceLock::new();
    HOOKS.get_or_init(ShutdownHooks::new)
}

/// Displays a Deephaven object inside an interactive Python console.
///
/// Example:
///     from deephaven import empty_table
///     t = empty_table(10).update("X = i")
///     w = DeephavenWidget(t, height=400)
///     w  # displays the iframe
#[pyclass(name = "DeephavenWidget")]
pub struct PyDeephavenWidget {
    inner: Arc<DeephavenWidget>,
    view: Py<PyAny>,
}

#[pymethods]
impl PyDeephavenWidget {
    /// Create a widget.
    ///
    /// Args:
    ///     deephaven_object: A Deephaven table or figure, a `pydeephaven`
    ///         table, or the name of a table already bound in `session`.
    ///     height: Iframe height in pixels. Defaults to 600.
    ///     width: Iframe width in pixels. 0 takes the full output width.
    ///     session: `pydeephaven` session. Required when
    ///         `deephaven_object` is a name.
    ///     view: ipywidgets widget whose traits receive the attributes.
    ///         Defaults to a new `DOMWidget` paired with the Deephaven
    ///         front-end view.
    ///
    /// Raises:
    ///     ValueError: a name was given without a session, or the session
    ///         could not be read.
    ///     DeephavenWidgetError: binding, authentication or the server failed.
    #[new]
    #[pyo3(signature = (deephaven_object, height=None, width=None, session=None, view=None))]
    fn new<'py>(
        py: Python<'py>,
        deephaven_object: &Bound<'py, PyAny>,
        height: Option<u32>,
        width: Option<u32>,
        session: Option<&Bound<'py, PyAny>>,
        view: Option<Py<PyAny>>,
    ) -> PyResult<Self> {
        let session = session
            .map(PySession::from_object)
            .transpose()
            .map_err(|e| {
                to_py_err(WidgetError::Configuration(format!("unusable session: {}", e)))
            })?;
        let name = deephaven_object.extract::<String>().ok();
        let object = PyDisplayable(deephaven_object.clone());
        let target = match &name {
            Some(name) => DisplayTarget::Named(name.as_str()),
            None => DisplayTarget::Object(&object),
        };

        let options = WidgetOptions::from_settings(&Settings::load()).with_size(width, height);

        let registry = MainNamespace::get(py)?;
        let local_server = EmbeddedServer(py);
        let proxy = ColabProxy(py);
        let host = WidgetHost {
            registry: &registry,
            local_server: &local_server,
            proxy: Some(&proxy),
            hooks: shutdown_hooks(),
        };

        let view = match view {
            Some(view) => view,
            None => new_dom_widget(py)?,
        };
        let sink = Box::new(TraitView::new(view.clone_ref(py)));

        let inner = DeephavenWidget::create(target, session.as_ref(), &options, &host, sink)
            .map_err(to_py_err)?;
        Ok(Self { inner, view })
    }

    /// The ipywidgets widget the attributes are synchronized to.
    #[getter]
    fn view(&self, py: Python<'_>) -> Py<PyAny> {
        self.view.clone_ref(py)
    }

    /// Rich display goes through the paired ipywidgets widget.
    #[pyo3(signature = (**kwargs))]
    fn _repr_mimebundle_<'py>(
        &self,
        py: Python<'py>,
        kwargs: Option<&Bound<'py, PyDict>>,
    ) -> PyResult<Bound<'py, PyAny>> {
        self.view
            .bind(py)
            .call_method("_repr_mimebundle_", (), kwargs)
    }

    #[getter]
    fn server_url(&self) -> String {
        self.inner.attributes().server_url
    }

    #[getter]
    fn iframe_url(&self) -> String {
        self.inner.attributes().iframe_url
    }

    #[getter]
    fn token(&self) -> String {
        self.inner.attributes().token
    }

    #[getter]
    fn object_id(&self) -> String {
        self.inner.attributes().object_id
    }

    #[getter]
    fn object_type(&self) -> String {
        self.inner.attributes().object_type
    }

    /// `table`, `chart` or `widget`.
    #[getter]
    fn kind(&self) -> &'static str {
        self.inner.kind().route()
    }

    /// False once the interpreter started shutting down.
    #[getter]
    fn kernel_active(&self) -> bool {
        self.inner.attributes().kernel_active
    }

    #[getter]
    fn width(&self) -> u32 {
        self.inner.attributes().width
    }

    #[setter]
    fn set_width(&self, width: u32) -> PyResult<()> {
        self.inner.set_width(width).map_err(to_py_err)
    }

    #[getter]
    fn height(&self) -> u32 {
        self.inner.attributes().height
    }

    #[setter]
    fn set_height(&self, height: u32) -> PyResult<()> {
        self.inner.set_height(height).map_err(to_py_err)
    }

    /// Every synchronized attribute, including the model/view identity.
    fn state<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        json_to_py(py, &serde_json::Value::Object(self.inner.state()))
    }

    fn __repr__(&self) -> String {
        let attributes = self.inner.attributes();
        format!(
            "DeephavenWidget(kind={}, name={}, url={}, active={})",
            self.inner.kind(),
            attributes.object_id,
            attributes.iframe_url,
            attributes.kernel_active
        )
    }
}
