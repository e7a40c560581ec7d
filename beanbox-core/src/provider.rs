//! The bean instance provider.
//!
//! One provider per test: it hands out a single shared instance per
//! requested type (fabricating a test double the first time an unknown type
//! is requested), keeps named values for value injection, and builds the
//! bean under test with all of its injection points satisfied.

use crate::bean::{Arguments, Bean};
use crate::config::{ProviderConfig, ValueSource};
use crate::descriptor::descriptor_of;
use crate::mock::MockFactories;
use crate::registry::InstanceRegistry;
use crate::values::ValueRegistry;
use crate::{Error, Result};
use std::any::{Any, type_name};
use std::sync::Arc;
use tracing::{debug, trace};

/// Handle to a provider given to context-aware beans. Shares the
/// provider's registries.
pub type BeanContext = BeanInstanceProvider;

/// Per-test registry and factory for beans, doubles and values.
///
/// Cloning yields a handle onto the same registries.
#[derive(Clone, Default)]
pub struct BeanInstanceProvider {
    instances: InstanceRegistry,
    values: ValueRegistry,
    factories: MockFactories,
    config: Arc<ProviderConfig>,
}

impl BeanInstanceProvider {
    pub fn new() -> Self {
        debug!("Creating bean instance provider");
        Self::default()
    }

    /// Build a provider and preload the values named by `config`.
    pub fn with_config(config: ProviderConfig) -> Result<Self> {
        let sources = config.sources();
        let provider = Self {
            config: Arc::new(config),
            ..Self::default()
        };

        for source in &sources {
            source.load_into(&provider.values)?;
        }

        debug!(
            auto_mock = provider.config.auto_mock,
            source_count = sources.len(),
            "Created bean instance provider from config"
        );
        Ok(provider)
    }

    /// Build a provider configured from `BEANBOX_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::with_config(ProviderConfig::from_env())
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// The instance known for `T`, fabricating and storing a test double
    /// if there is none yet. Repeated calls return the same `Arc`.
    pub fn get_instance_of<T>(&self) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        if let Some(instance) = self.instances.get::<T>() {
            return Ok(instance);
        }

        let type_name = type_name::<T>();
        if !self.config.auto_mock {
            debug!(bean = type_name, "Not registered and auto-mocking is disabled");
            return Err(Error::UnmockableType { type_name });
        }

        let double = self.factories.fabricate::<T>()?;
        debug!(bean = type_name, "Fabricated test double");
        Ok(self.instances.get_or_insert(double))
    }

    /// Construct a real `B` and satisfy every injection point it declares.
    ///
    /// Constructor parameters are resolved first, then fields and setters.
    /// The bean itself is not registered. On error no instance is returned.
    pub fn create_bean<B: Bean>(&self) -> Result<B> {
        let descriptor = descriptor_of::<B>()?;
        let bean_name = descriptor.type_name();

        if !descriptor.is_instantiable() {
            return Err(Error::invalid_target(bean_name, "type is not instantiable"));
        }

        debug!(
            bean = bean_name,
            points = descriptor.points().len(),
            "Creating bean"
        );

        let mut args = Arguments::new(bean_name);
        for point in descriptor.constructor_points() {
            args.push(point.member(), point.resolve(self, bean_name)?);
        }

        let mut bean = B::construct(args)?;

        for point in descriptor.member_points() {
            let value = point.resolve(self, bean_name)?;
            bean.inject(point, value)?;
            trace!(bean = bean_name, member = point.member(), "Injected");
        }

        debug!(bean = bean_name, "Bean created");
        Ok(bean)
    }

    /// Make `instance` the object returned for `T`, replacing any earlier one.
    pub fn register_instance<T>(&self, instance: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.instances.register(instance);
    }

    /// Register an owned value as the instance for its own type.
    pub fn register<T>(&self, instance: T) -> Arc<T>
    where
        T: Send + Sync + 'static,
    {
        let instance = Arc::new(instance);
        self.instances.register(Arc::clone(&instance));
        instance
    }

    /// Use `factory` to fabricate doubles of `T` for this provider,
    /// taking precedence over factories registered with `register_mock!`.
    pub fn register_mock_factory<T, F>(&self, factory: F)
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.factories.register(factory);
    }

    pub fn has_instance<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.instances.contains::<T>()
    }

    /// Whether `T` is registered or a double can be fabricated for it.
    pub fn can_resolve<T>(&self) -> bool
    where
        T: ?Sized + 'static,
    {
        self.instances.contains::<T>() || (self.config.auto_mock && self.factories.has::<T>())
    }

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// Values are typed: a member reads the key back as exactly the type it
    /// declares, so `set_value("k", "text")` stores a `&'static str` and a
    /// `String` member bound to `k` fails with [`Error::ValueType`]. No
    /// conversion is attempted.
    pub fn set_value<V>(&self, key: impl Into<String>, value: V)
    where
        V: Any + Send + Sync,
    {
        self.values.set(key, value);
    }

    /// The value stored under `key`; `Ok(None)` when it was never set.
    pub fn get_value<V>(&self, key: &str) -> Result<Option<V>>
    where
        V: Any + Clone,
    {
        self.values.get(key)
    }

    pub fn has_value(&self, key: &str) -> bool {
        self.values.contains(key)
    }

    pub fn remove_value(&self, key: &str) -> bool {
        self.values.remove(key)
    }

    /// Load values from a document, file or the environment.
    pub fn load_values(&self, source: &ValueSource) -> Result<usize> {
        source.load_into(&self.values)
    }

    pub fn instances(&self) -> &InstanceRegistry {
        &self.instances
    }

    pub fn values(&self) -> &ValueRegistry {
        &self.values
    }

    /// Forget every instance, value and per-provider mock factory.
    pub fn reset(&self) {
        self.instances.clear();
        self.values.clear();
        self.factories.clear();
        debug!("Bean instance provider reset");
    }
}

impl std::fmt::Debug for BeanInstanceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanInstanceProvider")
            .field("instances", &self.instances)
            .field("values", &self.values)
            .field("config", &self.config)
            .finish()
    }
}
