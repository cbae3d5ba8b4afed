//! Publishing objects so the server side can fetch them by identifier.
//!
//! Local objects are inserted into a process-wide reachable-objects registry
//! that the server component reads. Remote handles are bound inside their
//! owning session instead. Objects referenced by name are already bound and
//! need no publishing.
//!
//! The registry lives for the whole process: entries are never evicted and a
//! later insert under the same identifier replaces the earlier one.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use log::debug;

use crate::error::{SessionError, WidgetError};
use crate::object_id::ObjectId;
use crate::session::RemoteSession;
use crate::target::{DisplayTarget, Displayable};

/// A key-value namespace the server process reads objects from.
pub trait ObjectStore<O> {
    fn insert(&self, id: &ObjectId, obj: &O) -> Result<(), SessionError>;
}

/// In-memory reachable-objects registry.
///
/// Hosts embedding the server in-process share one instance for the process
/// lifetime; tests create a fresh one each.
pub struct ObjectRegistry<O> {
    objects: RwLock<HashMap<String, O>>,
}

impl<O: Clone> ObjectRegistry<O> {
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a published object.
    pub fn get(&self, id: &str) -> Option<O> {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        objects.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<O: Clone> Default for ObjectRegistry<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Clone> ObjectStore<O> for ObjectRegistry<O> {
    fn insert(&self, id: &ObjectId, obj: &O) -> Result<(), SessionError> {
        let mut objects = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        objects.insert(id.as_str().to_string(), obj.clone());
        Ok(())
    }
}

/// Where a target must be published.
pub enum Placement<S> {
    /// Insert into the local registry.
    Local,
    /// Bind inside this remote session.
    Remote(S),
    /// Already bound remotely by name.
    Bound,
}

/// Make `target` reachable under `id`.
pub fn publish<O: Displayable>(
    id: &ObjectId,
    target: DisplayTarget<'_, O>,
    placement: &Placement<O::Session>,
    store: &dyn ObjectStore<O>,
) -> Result<(), WidgetError> {
    let obj = match target {
        DisplayTarget::Named(_) => return Ok(()),
        DisplayTarget::Object(obj) => obj,
    };

    match placement {
        Placement::Bound => Ok(()),
        Placement::Local => {
            store
                .insert(id, obj)
                .map_err(|source| WidgetError::Registry {
                    name: id.to_string(),
                    source,
                })?;
            debug!("[registry] Published {} locally", id);
            Ok(())
        }
        Placement::Remote(session) => {
            session
                .bind_table(id.as_str(), obj)
                .map_err(|source| WidgetError::RemoteBind {
                    name: id.to_string(),
                    source,
                })?;
            debug!(
                "[registry] Bound {} in session {}:{}",
                id,
                session.host(),
                session.port()
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::DirectSession;
    use std::convert::Infallible;

    #[test]
    fn test_insert_and_get() {
        let registry: ObjectRegistry<String> = ObjectRegistry::new();
        let id = ObjectId::named("t_1");
        registry.insert(&id, &"table".to_string()).unwrap();

        assert!(registry.contains("t_1"));
        assert_eq!(registry.get("t_1"), Some("table".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_last_writer_wins() {
        let registry: ObjectRegistry<u32> = ObjectRegistry::new();
        let id = ObjectId::named("t_1");
        registry.insert(&id, &1).unwrap();
        registry.insert(&id, &2).unwrap();

        assert_eq!(registry.get("t_1"), Some(2));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_named_targets_are_not_published() {
        let registry: ObjectRegistry<Infallible> = ObjectRegistry::new();
        let placement: Placement<DirectSession> = Placement::Bound;
        publish(
            &ObjectId::named("existing"),
            DisplayTarget::<Infallible>::Named("existing"),
            &placement,
            &registry,
        )
        .unwrap();
        assert!(registry.is_empty());
    }
}
