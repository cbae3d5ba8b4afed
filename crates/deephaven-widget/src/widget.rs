//! The Deephaven console widget.
//!
//! Constructing a widget runs the whole pipeline: classify the target, pick an
//! identifier, resolve the serving endpoint, publish the object, apply
//! deployment overrides and build the iframe URL. The resulting attributes are
//! published to the paired front-end view in one go, and only then is the
//! widget registered for the shutdown notification. A failure before the
//! object is published leaves nothing behind. A view that rejects the
//! attributes fails construction without registering a shutdown hook, but the
//! object stays published under its identifier.
//!
//! ## Lifecycle
//!
//! A constructed widget is `Active` with `kernel_active = true`. The shutdown
//! notification moves it to `Inactive` and publishes `kernel_active = false`.
//! There is no way back.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::endpoint::{resolve, LocalServer};
use crate::error::WidgetError;
use crate::iframe::{build_iframe_url, QueryParams};
use crate::kind::DisplayKind;
use crate::object_id::ObjectId;
use crate::overrides::{apply_overrides, ProxyBridge};
use crate::registry::{publish, ObjectStore};
use crate::settings::{Settings, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::shutdown::{ShutdownHooks, ShutdownListener};
use crate::target::{DisplayTarget, Displayable};
use crate::view::AttributeSink;

/// Front-end model class the view registers.
pub const MODEL_NAME: &str = "DeephavenModel";

/// Front-end view class.
pub const VIEW_NAME: &str = "DeephavenView";

/// Front-end module providing the model and view.
pub const MODULE_NAME: &str = "@deephaven/ipywidgets";

/// Version of the front-end module this crate pairs with.
pub const MODULE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Attributes synchronized to the front-end view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetAttributes {
    pub server_url: String,
    pub iframe_url: String,
    pub width: u32,
    pub height: u32,
    pub token: String,
    pub kernel_active: bool,
    pub object_id: String,
    /// Type identity of the displayed object, empty for bare names.
    pub object_type: String,
}

impl WidgetAttributes {
    /// Full attribute map, including the model/view identity.
    pub fn to_state(&self) -> Map<String, Value> {
        let mut state = Map::new();
        state.insert("_model_name".into(), json!(MODEL_NAME));
        state.insert("_model_module".into(), json!(MODULE_NAME));
        state.insert("_model_module_version".into(), json!(MODULE_VERSION));
        state.insert("_view_name".into(), json!(VIEW_NAME));
        state.insert("_view_module".into(), json!(MODULE_NAME));
        state.insert("_view_module_version".into(), json!(MODULE_VERSION));
        if let Ok(Value::Object(attributes)) = serde_json::to_value(self) {
            state.extend(attributes);
        }
        state
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifecycle {
    Active,
    Inactive,
}

/// Per-widget options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetOptions {
    /// Iframe width in pixels; 0 takes the full output width.
    pub width: u32,
    pub height: u32,
    /// Base URL forced over whatever resolution decides.
    pub url_override: Option<String>,
}

impl Default for WidgetOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            url_override: None,
        }
    }
}

impl WidgetOptions {
    /// Options from settings, honoring the `DEEPHAVEN_IPY_URL` environment
    /// variable.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            width: settings.default_width,
            height: settings.default_height,
            url_override: settings.url_override(),
        }
    }

    pub fn with_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        if let Some(width) = width {
            self.width = width;
        }
        if let Some(height) = height {
            self.height = height;
        }
        self
    }
}

/// Host-provided collaborators a widget is built against.
pub struct WidgetHost<'a, O> {
    /// Reachable-objects registry the local server reads.
    pub registry: &'a dyn ObjectStore<O>,
    pub local_server: &'a dyn LocalServer,
    /// Hosted-notebook port proxy, if the environment may have one.
    pub proxy: Option<&'a dyn ProxyBridge>,
    pub hooks: &'a ShutdownHooks,
}

/// A displayed Deephaven object.
pub struct DeephavenWidget {
    kind: DisplayKind,
    attributes: Mutex<WidgetAttributes>,
    lifecycle: Mutex<Lifecycle>,
    view: Box<dyn AttributeSink>,
}

impl std::fmt::Debug for DeephavenWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeephavenWidget")
            .field("kind", &self.kind)
            .field("lifecycle", &self.lifecycle())
            .field("object_id", &self.attributes().object_id)
            .finish()
    }
}

impl DeephavenWidget {
    /// Build a widget for `target` and publish its attributes to `view`.
    ///
    /// `session` is required when `target` is a bare name and ignored
    /// otherwise.
    ///
    /// The object is published (inserted into `host.registry` or bound in the
    /// remote session) before the view sees the attributes, since the iframe
    /// fetches it by identifier. A `WidgetError::Publish` therefore leaves that
    /// registry entry or remote binding in place; it is not rolled back.
    pub fn create<O: Displayable>(
        target: DisplayTarget<'_, O>,
        session: Option<&O::Session>,
        options: &WidgetOptions,
        host: &WidgetHost<'_, O>,
        view: Box<dyn AttributeSink>,
    ) -> Result<Arc<Self>, WidgetError> {
        let object_id = match target {
            DisplayTarget::Named(name) => ObjectId::named(name),
            DisplayTarget::Object(_) => ObjectId::generate(),
        };

        let resolution = resolve(target, session, host.local_server)?;
        publish(&object_id, target, &resolution.placement, host.registry)?;

        let endpoint = apply_overrides(
            resolution.endpoint,
            resolution.port,
            options.url_override.as_deref(),
            host.proxy,
        );

        let mut params = QueryParams::new();
        params.insert("name", object_id.as_str());
        params.extend(endpoint.extra_params.iter());
        let iframe_url = build_iframe_url(&endpoint.base_url, resolution.kind, &params);

        let attributes = WidgetAttributes {
            server_url: endpoint.base_url,
            iframe_url,
            width: options.width,
            height: options.height,
            token: endpoint.auth_token,
            kernel_active: true,
            object_id: object_id.to_string(),
            object_type: target.type_identity(),
        };

        view.publish(&attributes.to_state())
            .map_err(WidgetError::Publish)?;

        info!(
            "[widget] Displaying {} as {} at {}",
            attributes.object_id, resolution.kind, attributes.iframe_url
        );

        let widget = Arc::new(Self {
            kind: resolution.kind,
            attributes: Mutex::new(attributes),
            lifecycle: Mutex::new(Lifecycle::Active),
            view,
        });
        let listener: Weak<DeephavenWidget> = Arc::downgrade(&widget);
        host.hooks.register(listener);

        Ok(widget)
    }

    pub fn kind(&self) -> DisplayKind {
        self.kind
    }

    /// Snapshot of the current attributes.
    pub fn attributes(&self) -> WidgetAttributes {
        self.attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Full attribute map as the view sees it.
    pub fn state(&self) -> Map<String, Value> {
        self.attributes().to_state()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle() == Lifecycle::Active
    }

    pub fn set_width(&self, width: u32) -> Result<(), WidgetError> {
        self.update(|attributes| attributes.width = width, json!({ "width": width }))
    }

    pub fn set_height(&self, height: u32) -> Result<(), WidgetError> {
        self.update(
            |attributes| attributes.height = height,
            json!({ "height": height }),
        )
    }

    /// Publish `delta` and apply `change` locally once the view accepted it.
    ///
    /// The view may read the widget back while publishing, so no lock is held
    /// across the call.
    fn update(
        &self,
        change: impl FnOnce(&mut WidgetAttributes),
        delta: Value,
    ) -> Result<(), WidgetError> {
        if let Value::Object(delta) = delta {
            self.view.publish(&delta).map_err(WidgetError::Publish)?;
        }
        let mut attributes = self
            .attributes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        change(&mut attributes);
        Ok(())
    }
}

impl ShutdownListener for DeephavenWidget {
    fn on_shutdown(&self) {
        {
            let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
            if *lifecycle == Lifecycle::Inactive {
                return;
            }
            *lifecycle = Lifecycle::Inactive;
        }

        let object_id = {
            let mut attributes = self
                .attributes
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            attributes.kernel_active = false;
            attributes.object_id.clone()
        };

        let mut delta = Map::new();
        delta.insert("kernel_active".into(), Value::Bool(false));
        if let Err(e) = self.view.publish(&delta) {
            warn!("[widget] Failed to publish shutdown of {}: {}", object_id, e);
        }
    }
}
