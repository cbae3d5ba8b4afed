//! Attribute publishing to the paired front-end view.
//!
//! The widget bridge itself (model/view sync, serialization to the browser) is
//! provided by the host. The widget only needs to hand it an attribute map:
//! the full state once at construction, and deltas afterwards.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SessionError;

/// Receiver of widget attribute maps.
pub trait AttributeSink: Send + Sync {
    fn publish(&self, attributes: &Map<String, Value>) -> Result<(), SessionError>;
}

impl<T: AttributeSink + ?Sized> AttributeSink for Arc<T> {
    fn publish(&self, attributes: &Map<String, Value>) -> Result<(), SessionError> {
        (**self).publish(attributes)
    }
}

/// Snapshot of the state a view has received.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewSnapshot {
    /// Current state, merged from all publishes.
    pub state: Value,

    /// Extracted from `_model_module` for convenience.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_module: Option<String>,

    /// Extracted from `_model_name` for convenience.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

/// In-memory view that merges every publish into a single snapshot.
pub struct ViewState {
    snapshot: RwLock<Option<ViewSnapshot>>,
    publishes: AtomicU64,
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            snapshot: RwLock::new(None),
            publishes: AtomicU64::new(0),
        }
    }

    /// Current snapshot, `None` until something was published.
    pub fn snapshot(&self) -> Option<ViewSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Value of a single attribute.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.snapshot().and_then(|s| s.state.get(key).cloned())
    }

    /// Number of publishes received.
    pub fn publish_count(&self) -> u64 {
        self.publishes.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_none()
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl AttributeSink for ViewState {
    fn publish(&self, attributes: &Map<String, Value>) -> Result<(), SessionError> {
        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);

        match snapshot.as_mut() {
            Some(existing) => {
                // Only keys present in the delta change
                if let Some(state) = existing.state.as_object_mut() {
                    for (key, value) in attributes {
                        state.insert(key.clone(), value.clone());
                    }
                }
            }
            None => {
                let model_module = attributes
                    .get("_model_module")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());
                let model_name = attributes
                    .get("_model_name")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string());
                *snapshot = Some(ViewSnapshot {
                    state: Value::Object(attributes.clone()),
                    model_module,
                    model_name,
                });
            }
        }

        self.publishes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_first_publish_creates_snapshot() {
        let view = ViewState::new();
        assert!(view.is_empty());

        view.publish(&map(json!({
            "_model_name": "DeephavenModel",
            "_model_module": "@deephaven/ipywidgets",
            "height": 600
        })))
        .unwrap();

        let snapshot = view.snapshot().unwrap();
        assert_eq!(snapshot.model_name.as_deref(), Some("DeephavenModel"));
        assert_eq!(
            snapshot.model_module.as_deref(),
            Some("@deephaven/ipywidgets")
        );
        assert_eq!(snapshot.state["height"], 600);
        assert_eq!(view.publish_count(), 1);
    }

    #[test]
    fn test_later_publishes_merge() {
        let view = ViewState::new();
        view.publish(&map(json!({"kernel_active": true, "height": 600})))
            .unwrap();
        view.publish(&map(json!({"kernel_active": false}))).unwrap();

        assert_eq!(view.get("kernel_active"), Some(json!(false)));
        assert_eq!(view.get("height"), Some(json!(600)));
        assert_eq!(view.publish_count(), 2);
    }

    #[test]
    fn test_shared_view() {
        let view = Arc::new(ViewState::new());
        let sink: Box<dyn AttributeSink> = Box::new(view.clone());
        sink.publish(&map(json!({"width": 0}))).unwrap();
        assert_eq!(view.get("width"), Some(json!(0)));
    }
}
