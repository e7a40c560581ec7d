// Instance registry: one shared instance per requested type

use parking_lot::RwLock;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

struct Entry {
    type_name: &'static str,
    // Always holds an `Arc<T>` for the `TypeId` it is keyed by
    instance: Box<dyn Any + Send + Sync>,
}

/// Registry mapping a type to the single instance handed out for it.
///
/// Keys may be concrete types or trait objects (`dyn Repository`), so
/// instances are stored as `Arc<T>` with `T: ?Sized`. Clones share the
/// same underlying map.
#[derive(Clone, Default)]
pub struct InstanceRegistry {
    instances: Arc<RwLock<HashMap<TypeId, Entry>>>,
}

impl InstanceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `instance` under `T`, replacing any previous entry for `T`.
    pub fn register<T>(&self, instance: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_name = type_name::<T>();
        let entry = Entry {
            type_name,
            instance: Box::new(instance),
        };

        let replaced = self
            .instances
            .write()
            .insert(TypeId::of::<T>(), entry)
            .is_some();

        debug!(bean = type_name, replaced, "Instance registered");
    }

    /// Look up the instance stored under `T`.
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let instances = self.instances.read();
        let found = instances
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.instance.downcast_ref::<Arc<T>>())
            .cloned();

        trace!(bean = type_name::<T>(), found = found.is_some(), "Instance lookup");
        found
    }

    /// Store `instance` unless `T` already has one; returns whichever is kept.
    pub fn get_or_insert<T>(&self, instance: Arc<T>) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let mut instances = self.instances.write();
        let entry = instances.entry(TypeId::of::<T>()).or_insert_with(|| Entry {
            type_name: type_name::<T>(),
            instance: Box::new(Arc::clone(&instance)),
        });

        entry
            .instance
            .downcast_ref::<Arc<T>>()
            .cloned()
            .unwrap_or(instance)
    }

    pub fn contains<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.instances.read().contains_key(&TypeId::of::<T>())
    }

    /// Drop the instance stored under `T`. Returns whether one existed.
    pub fn remove<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        let removed = self.instances.write().remove(&TypeId::of::<T>()).is_some();
        debug!(bean = type_name::<T>(), removed, "Instance removed");
        removed
    }

    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }

    /// Names of every registered type, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .instances
            .read()
            .values()
            .map(|entry| entry.type_name)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn clear(&self) {
        let mut instances = self.instances.write();
        let count = instances.len();
        instances.clear();

        debug!(instance_count = count, "Cleared instance registry");
    }
}

impl std::fmt::Debug for InstanceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[derive(Debug, PartialEq)]
    struct Settings {
        name: String,
    }

    #[test]
    fn test_register_and_get_concrete() {
        let registry = InstanceRegistry::new();
        registry.register(Arc::new(Settings {
            name: "test".to_string(),
        }));

        let settings = registry.get::<Settings>().unwrap();
        assert_eq!(settings.name, "test");
        assert!(registry.contains::<Settings>());
    }

    #[test]
    fn test_register_trait_object() {
        let registry = InstanceRegistry::new();
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        registry.register(Arc::clone(&greeter));

        let resolved = registry.get::<dyn Greeter>().unwrap();
        assert!(Arc::ptr_eq(&resolved, &greeter));
        assert_eq!(resolved.greet(), "hello");

        // Keyed by the exact type, not the implementation
        assert!(registry.get::<English>().is_none());
    }

    #[test]
    fn test_register_replaces() {
        let registry = InstanceRegistry::new();
        let first = Arc::new(Settings {
            name: "first".to_string(),
        });
        let second = Arc::new(Settings {
            name: "second".to_string(),
        });

        registry.register(first);
        registry.register(Arc::clone(&second));

        assert!(Arc::ptr_eq(&registry.get::<Settings>().unwrap(), &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_get_or_insert_keeps_existing() {
        let registry = InstanceRegistry::new();
        let existing = Arc::new(Settings {
            name: "existing".to_string(),
        });
        registry.register(Arc::clone(&existing));

        let kept = registry.get_or_insert(Arc::new(Settings {
            name: "new".to_string(),
        }));
        assert!(Arc::ptr_eq(&kept, &existing));
    }

    #[test]
    fn test_remove_and_clear() {
        let registry = InstanceRegistry::new();
        registry.register(Arc::new(Settings {
            name: "x".to_string(),
        }));
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        registry.register(greeter);
        assert_eq!(registry.len(), 2);

        assert!(registry.remove::<Settings>());
        assert!(!registry.remove::<Settings>());

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let registry = InstanceRegistry::new();
        let handle = registry.clone();
        handle.register(Arc::new(Settings {
            name: "shared".to_string(),
        }));

        assert!(registry.contains::<Settings>());
    }
}
