// Named values for value injection

use crate::{Error, Result};
use parking_lot::RwLock;
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Clone)]
struct StoredValue {
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
}

/// Key/value store backing value injection. Clones share the same map.
#[derive(Clone, Default)]
pub struct ValueRegistry {
    values: Arc<RwLock<HashMap<String, StoredValue>>>,
}

impl ValueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn set<V>(&self, key: impl Into<String>, value: V)
    where
        V: Any + Send + Sync,
    {
        let key = key.into();
        let stored = StoredValue {
            type_name: type_name::<V>(),
            value: Arc::new(value),
        };

        debug!(key = %key, value_type = stored.type_name, "Value set");
        self.values.write().insert(key, stored);
    }

    /// Fetch a clone of the value under `key`.
    ///
    /// Returns `Ok(None)` when the key was never set, and
    /// [`Error::ValueType`] when the stored value is not a `V`.
    pub fn get<V>(&self, key: &str) -> Result<Option<V>>
    where
        V: Any + Clone,
    {
        let values = self.values.read();
        let Some(stored) = values.get(key) else {
            trace!(key, "Value not set");
            return Ok(None);
        };

        stored
            .value
            .downcast_ref::<V>()
            .cloned()
            .map(Some)
            .ok_or_else(|| {
                debug!(
                    key,
                    stored = stored.type_name,
                    requested = type_name::<V>(),
                    "Value type mismatch"
                );
                Error::ValueType {
                    key: key.to_string(),
                    expected: type_name::<V>(),
                }
            })
    }

    /// Type name of the value stored under `key`.
    pub fn type_of(&self, key: &str) -> Option<&'static str> {
        self.values.read().get(key).map(|stored| stored.type_name)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> bool {
        self.values.write().remove(key).is_some()
    }

    /// All keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.values.read().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    pub fn clear(&self) {
        let mut values = self.values.write();
        let count = values.len();
        values.clear();

        debug!(value_count = count, "Cleared value registry");
    }
}

impl std::fmt::Debug for ValueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let values = ValueRegistry::new();
        values.set("mail.sender", "noreply@example.com".to_string());
        values.set("mail.retries", 3u32);

        assert_eq!(
            values.get::<String>("mail.sender").unwrap(),
            Some("noreply@example.com".to_string())
        );
        assert_eq!(values.get::<u32>("mail.retries").unwrap(), Some(3));
    }

    #[test]
    fn test_unset_key_is_absent() {
        let values = ValueRegistry::new();
        assert_eq!(values.get::<String>("missing").unwrap(), None);
        assert!(!values.contains("missing"));
    }

    #[test]
    fn test_configured_zero_is_not_absent() {
        let values = ValueRegistry::new();
        values.set("limit", 0i64);
        values.set("maybe", Option::<String>::None);

        assert_eq!(values.get::<i64>("limit").unwrap(), Some(0));
        assert_eq!(values.get::<Option<String>>("maybe").unwrap(), Some(None));
    }

    #[test]
    fn test_type_mismatch() {
        let values = ValueRegistry::new();
        values.set("port", 8080u16);

        let err = values.get::<String>("port").unwrap_err();
        assert!(matches!(err, Error::ValueType { ref key, .. } if key == "port"));
        assert_eq!(values.type_of("port"), Some("u16"));
    }

    #[test]
    fn test_overwrite_and_remove() {
        let values = ValueRegistry::new();
        values.set("key", 1i32);
        values.set("key", 2i32);
        assert_eq!(values.get::<i32>("key").unwrap(), Some(2));
        assert_eq!(values.len(), 1);

        assert!(values.remove("key"));
        assert!(values.is_empty());
    }

    #[test]
    fn test_keys_sorted() {
        let values = ValueRegistry::new();
        values.set("b", true);
        values.set("a", false);
        assert_eq!(values.keys(), vec!["a".to_string(), "b".to_string()]);

        values.clear();
        assert!(values.keys().is_empty());
    }
}
