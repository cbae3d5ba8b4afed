//! Identifiers naming published objects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name under which a displayed object is reachable by the server.
///
/// Generated identifiers are `t_` followed by a v4 UUID with hyphens replaced
/// by underscores, so they are valid both as a global variable name and as a
/// URL query value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(format!("t_{}", Uuid::new_v4().to_string().replace('-', "_")))
    }

    /// Use an existing name verbatim (object already bound remotely).
    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_key_and_query_safe() {
        let id = ObjectId::generate();
        assert!(id.as_str().starts_with("t_"));
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_'));
        assert!(!id.as_str().contains('-'));
    }

    #[test]
    fn test_generated_ids_do_not_collide() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(ObjectId::generate()));
        }
    }

    #[test]
    fn test_named_is_verbatim() {
        assert_eq!(ObjectId::named("my_table").as_str(), "my_table");
    }
}
