//! Python-side collaborators.
//!
//! Adapts Python objects to the widget's collaborator traits: displayed
//! objects, `pydeephaven` sessions, the `__main__` namespace the embedded
//! server reads from, the embedded server itself, the Colab port proxy and
//! the ipywidgets view.

use std::collections::HashMap;

use deephaven_widget::overrides::ProxyBridge;
use deephaven_widget::settings::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use deephaven_widget::widget::VIEW_NAME;
use deephaven_widget::{
    AttributeSink, AuthClient, Displayable, LocalServer, ObjectId, ObjectStore, RemoteSession,
    SessionError, SessionManager, TokenMessage, WidgetAttributes, WidgetError,
};
use log::{debug, warn};
use pyo3::prelude::*;
use pyo3::sync::PyOnceLock;
use pyo3::types::{PyDict, PyTuple};
use serde_json::{Map, Value};

fn session_err(err: PyErr) -> SessionError {
    SessionError::new(err.to_string())
}

/// `module.ClassName` of a Python object.
pub fn type_identity(obj: &Bound<'_, PyAny>) -> PyResult<String> {
    let class = obj.getattr("__class__")?;
    let module: String = class.getattr("__module__")?.extract()?;
    let name: String = class.getattr("__name__")?.extract()?;
    Ok(format!("{}.{}", module, name))
}

/// Convert a JSON value to the equivalent Python object.
pub fn json_to_py<'py>(py: Python<'py>, value: &Value) -> PyResult<Bound<'py, PyAny>> {
    PyModule::import(py, "json")?.call_method1("loads", (value.to_string(),))
}

/// A Python object to display.
pub struct PyDisplayable<'py>(pub Bound<'py, PyAny>);

impl<'py> Displayable for PyDisplayable<'py> {
    type Session = PySession<'py>;

    fn type_identity(&self) -> String {
        type_identity(&self.0).unwrap_or_default()
    }

    fn session(&self) -> Result<Option<PySession<'py>>, WidgetError> {
        let session = match self.0.getattr("session") {
            Ok(session) if !session.is_none() => session,
            _ => return Ok(None),
        };
        PySession::from_object(&session).map(Some).map_err(|e| {
            WidgetError::Configuration(format!("unusable session on remote table: {}", e))
        })
    }
}

/// A `pydeephaven.Session` (or a managed session subclass).
pub struct PySession<'py> {
    session: Bound<'py, PyAny>,
    host: String,
    port: u16,
    headers: HashMap<Vec<u8>, Vec<u8>>,
    manager: Option<PySessionManager<'py>>,
}

impl<'py> PySession<'py> {
    pub fn from_object(session: &Bound<'py, PyAny>) -> PyResult<Self> {
        let host: String = session.getattr("host")?.extract()?;
        let port: u16 = session.getattr("port")?.extract()?;

        let headers = match session.getattr("_extra_headers") {
            Ok(headers) if !headers.is_none() => {
                headers.extract::<HashMap<Vec<u8>, Vec<u8>>>()?
            }
            _ => HashMap::new(),
        };

        let manager = if session.hasattr("session_manager")? {
            let manager = session.getattr("session_manager")?;
            Some(PySessionManager {
                auth_client: manager.getattr("auth_client")?,
            })
        } else {
            None
        };

        Ok(Self {
            session: session.clone(),
            host,
            port,
            headers,
            manager,
        })
    }
}

impl<'py> RemoteSession for PySession<'py> {
    type Handle = PyDisplayable<'py>;

    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn extra_header(&self, name: &[u8]) -> Option<Vec<u8>> {
        self.headers.get(name).cloned()
    }

    fn session_manager(&self) -> Option<&dyn SessionManager> {
        self.manager.as_ref().map(|m| m as &dyn SessionManager)
    }

    fn static_url(&self) -> Result<String, SessionError> {
        self.session
            .call_method0("pqinfo")
            .and_then(|info| info.getattr("state"))
            .and_then(|state| state.getattr("connectionDetails"))
            .and_then(|details| details.getattr("staticUrl"))
            .and_then(|url| url.extract::<String>().map_err(Into::into))
            .map_err(session_err)
    }

    fn bind_table(&self, name: &str, handle: &PyDisplayable<'py>) -> Result<(), SessionError> {
        self.session
            .call_method1("bind_table", (name, &handle.0))
            .map(|_| ())
            .map_err(session_err)
    }
}

/// Session manager of an Enterprise (orchestrated) session.
pub struct PySessionManager<'py> {
    auth_client: Bound<'py, PyAny>,
}

impl SessionManager for PySessionManager<'_> {
    fn auth_client(&self) -> &dyn AuthClient {
        self
    }
}

impl AuthClient for PySessionManager<'_> {
    fn get_token(&self, role: &str) -> Result<TokenMessage, SessionError> {
        self.auth_client
            .call_method1("get_token", (role,))
            .and_then(|token| token.call_method0("SerializeToString"))
            .and_then(|bytes| bytes.extract::<Vec<u8>>().map_err(Into::into))
            .map(TokenMessage::new)
            .map_err(session_err)
    }
}

/// The `__main__` module namespace.
pub struct MainNamespace<'py>(Bound<'py, PyDict>);

impl<'py> MainNamespace<'py> {
    pub fn get(py: Python<'py>) -> PyResult<Self> {
        Ok(Self(PyModule::import(py, "__main__")?.dict()))
    }
}

impl<'py> ObjectStore<PyDisplayable<'py>> for MainNamespace<'py> {
    fn insert(&self, id: &ObjectId, obj: &PyDisplayable<'py>) -> Result<(), SessionError> {
        self.0.set_item(id.as_str(), &obj.0).map_err(session_err)
    }
}

/// `deephaven_server.Server.instance`.
pub struct EmbeddedServer<'py>(pub Python<'py>);

impl LocalServer for EmbeddedServer<'_> {
    fn port(&self) -> Result<u16, WidgetError> {
        PyModule::import(self.0, "deephaven_server")
            .and_then(|module| module.getattr("Server"))
            .and_then(|server| server.getattr("instance"))
            .and_then(|instance| instance.getattr("port"))
            .and_then(|port| port.extract::<u16>().map_err(Into::into))
            .map_err(|e| WidgetError::LocalServer(session_err(e)))
    }
}

/// Google Colab's kernel port proxy.
pub struct ColabProxy<'py>(pub Python<'py>);

impl ProxyBridge for ColabProxy<'_> {
    fn proxy_port(&self, port: u16) -> Option<String> {
        let output = match PyModule::import(self.0, "google.colab.output") {
            Ok(output) => output,
            Err(_) => {
                debug!("[py] Not running in Colab");
                return None;
            }
        };
        output
            .call_method1(
                "eval_js",
                (format!("google.colab.kernel.proxyPort({})", port),),
            )
            .and_then(|url| url.extract::<String>().map_err(Into::into))
            .map_err(|e: PyErr| warn!("[py] Colab proxy failed for port {}: {}", port, e))
            .ok()
    }
}

/// An ipywidgets widget whose traits mirror the attributes.
pub struct TraitView {
    widget: Py<PyAny>,
}

impl TraitView {
    pub fn new(widget: Py<PyAny>) -> Self {
        Self { widget }
    }
}

impl AttributeSink for TraitView {
    fn publish(&self, attributes: &Map<String, Value>) -> Result<(), SessionError> {
        Python::attach(|py| -> PyResult<()> {
            let widget = self.widget.bind(py);
            for (key, value) in attributes {
                // Model identity is declared by the Python class itself
                if key.starts_with('_') {
                    continue;
                }
                widget.call_method1("set_trait", (key.as_str(), json_to_py(py, value)?))?;
            }
            Ok(())
        })
        .map_err(session_err)
    }
}

/// Traitlet declaring `value` as a synchronized trait with that default.
fn synced_trait<'py>(
    traitlets: &Bound<'py, PyModule>,
    value: &Value,
) -> PyResult<Bound<'py, PyAny>> {
    let py = traitlets.py();
    let trait_type = match value {
        Value::Bool(_) => "Bool",
        Value::Number(_) => "Integer",
        _ => "Unicode",
    };
    let sync = PyDict::new(py);
    sync.set_item("sync", true)?;
    traitlets
        .getattr(trait_type)?
        .call1((json_to_py(py, value)?,))?
        .call_method("tag", (), Some(&sync))
}

/// `ipywidgets.DOMWidget` subclass paired with the front-end view.
///
/// Model/view identity and the synchronized traits are taken from the widget
/// state, so the class always matches what `TraitView` publishes.
fn dom_widget_class(py: Python<'_>) -> PyResult<&Bound<'_, PyAny>> {
    static CLASS: PyOnceLock<Py<PyAny>> = PyOnceLock::new();
    CLASS
        .get_or_try_init(py, || {
            let template = WidgetAttributes {
                server_url: String::new(),
                iframe_url: String::new(),
                width: DEFAULT_WIDTH,
                height: DEFAULT_HEIGHT,
                token: String::new(),
                kernel_active: true,
                object_id: String::new(),
                object_type: String::new(),
            };
            let traitlets = PyModule::import(py, "traitlets")?;
            let namespace = PyDict::new(py);
            for (key, value) in template.to_state() {
                namespace.set_item(key, synced_trait(&traitlets, &value)?)?;
            }
            let base = PyModule::import(py, "ipywidgets")?.getattr("DOMWidget")?;
            let class = PyModule::import(py, "builtins")?.getattr("type")?.call1((
                VIEW_NAME,
                PyTuple::new(py, [base])?,
                namespace,
            ))?;
            Ok::<_, PyErr>(class.unbind())
        })
        .map(|class| class.bind(py))
}

/// A fresh ipywidgets widget to display the attributes in.
pub fn new_dom_widget(py: Python<'_>) -> PyResult<Py<PyAny>> {
    Ok(dom_widget_class(py)?.call0()?.unbind())
}
