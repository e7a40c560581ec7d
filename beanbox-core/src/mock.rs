// Mock factories used to fabricate test doubles

use crate::{Error, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// A freshly fabricated double, boxed as the `Arc<T>` it was built for.
pub type Fabricated = Box<dyn Any + Send + Sync>;

/// Process-wide mock factory, submitted with [`register_mock!`](crate::register_mock).
///
/// `TypeId::of` and `type_name` are not `const`, so both are stored as
/// function pointers to keep the factory constructible in a static.
pub struct MockFactory {
    type_id: fn() -> TypeId,
    type_name: fn() -> &'static str,
    create: fn() -> Fabricated,
}

impl MockFactory {
    /// `create` must return a boxed `Arc<T>` where `T` is the type
    /// identified by `type_id`.
    pub const fn new(
        type_id: fn() -> TypeId,
        type_name: fn() -> &'static str,
        create: fn() -> Fabricated,
    ) -> Self {
        Self {
            type_id,
            type_name,
            create,
        }
    }

    pub fn mocked_type_id(&self) -> TypeId {
        (self.type_id)()
    }

    pub fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    pub fn fabricate(&self) -> Fabricated {
        (self.create)()
    }
}

impl std::fmt::Debug for MockFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockFactory")
            .field("type_name", &self.type_name())
            .finish()
    }
}

inventory::collect!(MockFactory);

/// Concrete types that know how to build a stand-in for themselves.
pub trait Mockable: Send + Sync + 'static {
    fn mock() -> Self;
}

/// Register a process-wide mock factory.
///
/// ```ignore
/// register_mock!(dyn Repository => MockRepository::new());
/// register_mock!(Clock); // uses `<Clock as Mockable>::mock()`
/// ```
#[macro_export]
macro_rules! register_mock {
    ($ty:ty => $make:expr) => {
        $crate::inventory::submit! {
            $crate::MockFactory::new(
                || ::std::any::TypeId::of::<$ty>(),
                || ::std::any::type_name::<$ty>(),
                || {
                    let instance: ::std::sync::Arc<$ty> = ::std::sync::Arc::new($make);
                    ::std::boxed::Box::new(instance)
                },
            )
        }
    };
    ($ty:ty) => {
        $crate::register_mock!($ty => <$ty as $crate::Mockable>::mock());
    };
}

static CATALOG: Lazy<HashMap<TypeId, &'static MockFactory>> = Lazy::new(|| {
    let mut catalog = HashMap::new();
    for factory in inventory::iter::<MockFactory> {
        if catalog.insert(factory.mocked_type_id(), factory).is_some() {
            warn!(bean = factory.type_name(), "Duplicate mock factory registration");
        }
    }
    debug!(factory_count = catalog.len(), "Collected mock factory catalog");
    catalog
});

/// Look up the process-wide factory for a type.
pub fn catalog_factory(type_id: TypeId) -> Option<&'static MockFactory> {
    CATALOG.get(&type_id).copied()
}

type LocalFactory = Arc<dyn Fn() -> Fabricated + Send + Sync>;

/// Per-provider factories, consulted before the process-wide catalog.
#[derive(Clone, Default)]
pub(crate) struct MockFactories {
    local: Arc<RwLock<HashMap<TypeId, LocalFactory>>>,
}

impl MockFactories {
    pub(crate) fn register<T, F>(&self, factory: F)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        let local: LocalFactory = Arc::new(move || Box::new(factory()) as Fabricated);
        self.local.write().insert(TypeId::of::<T>(), local);

        debug!(bean = type_name::<T>(), "Mock factory registered");
    }

    pub(crate) fn has<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        let type_id = TypeId::of::<T>();
        self.local.read().contains_key(&type_id) || catalog_factory(type_id).is_some()
    }

    /// Build a new double for `T`.
    pub(crate) fn fabricate<T>(&self) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let type_id = TypeId::of::<T>();
        let type_name = type_name::<T>();

        // Clone out of the lock: the factory may be arbitrary user code
        let local = self.local.read().get(&type_id).cloned();
        let fabricated = match local {
            Some(factory) => factory(),
            None => catalog_factory(type_id)
                .ok_or(Error::UnmockableType { type_name })?
                .fabricate(),
        };

        fabricated
            .downcast::<Arc<T>>()
            .map(|instance| *instance)
            .map_err(|_| {
                warn!(bean = type_name, "Mock factory produced a different type");
                Error::UnmockableType { type_name }
            })
    }

    pub(crate) fn clear(&self) {
        self.local.write().clear();
    }
}
