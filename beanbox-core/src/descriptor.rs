//! Injection descriptors.
//!
//! A [`BeanDescriptor`] lists every injection point of a bean type: which
//! member receives what, and through which injection style. Descriptors are
//! produced by [`Bean::descriptor`] (usually generated by `#[derive(Bean)]`),
//! validated, and cached per type for the life of the process.

use crate::bean::{Bean, Resolved};
use crate::{BeanInstanceProvider, Error, Result};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::{Any, TypeId, type_name};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

/// How the target is brought into existence before member injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Construction {
    /// No-argument construction; members start from their defaults.
    Default,
    /// A named associated function taking the constructor parameters.
    Constructor(&'static str),
    /// Not instantiable.
    Abstract,
}

/// The injection style of a single point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionKind {
    /// Supplied as the constructor argument at `position`.
    Constructor { position: usize },
    /// Assigned directly to the member after construction.
    Field,
    /// Passed to `method` after construction.
    Setter { method: &'static str },
}

type InstanceResolver = fn(&BeanInstanceProvider) -> Result<Resolved>;
type ValueResolver = fn(&BeanInstanceProvider, &str) -> Result<Option<Resolved>>;

/// What an injection point receives.
#[derive(Clone, Copy)]
pub enum Dependency {
    /// The registry instance of a type, as `Arc<T>`.
    Instance {
        type_name: &'static str,
        resolve: InstanceResolver,
    },
    /// A named value. Required values fail when the key is unset;
    /// optional ones receive `Option<V>`.
    Value {
        key: &'static str,
        required: bool,
        type_name: &'static str,
        resolve: ValueResolver,
    },
    /// A nested bean built with [`BeanInstanceProvider::create_bean`].
    Bean {
        type_name: &'static str,
        create: InstanceResolver,
    },
    /// A handle to the provider itself.
    Context,
}

impl Dependency {
    pub fn instance<T>() -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Dependency::Instance {
            type_name: type_name::<T>(),
            resolve: |provider| Ok(Box::new(provider.get_instance_of::<T>()?) as Resolved),
        }
    }

    /// Value that must be set; resolves to `V`.
    pub fn value<V>(key: &'static str) -> Self
    where
        V: Any + Clone,
    {
        Dependency::Value {
            key,
            required: true,
            type_name: type_name::<V>(),
            resolve: |provider, key| {
                Ok(provider
                    .get_value::<V>(key)?
                    .map(|value| Box::new(value) as Resolved))
            },
        }
    }

    /// Value that may be unset; resolves to `Option<V>`.
    pub fn optional_value<V>(key: &'static str) -> Self
    where
        V: Any + Clone,
    {
        Dependency::Value {
            key,
            required: false,
            type_name: type_name::<V>(),
            resolve: |provider, key| {
                Ok(Some(Box::new(provider.get_value::<V>(key)?) as Resolved))
            },
        }
    }

    pub fn bean<B: Bean>() -> Self {
        Dependency::Bean {
            type_name: type_name::<B>(),
            create: |provider| Ok(Box::new(provider.create_bean::<B>()?) as Resolved),
        }
    }

    pub fn context() -> Self {
        Dependency::Context
    }

    /// Name of the type this dependency resolves to.
    pub fn type_name(&self) -> &'static str {
        match self {
            Dependency::Instance { type_name, .. }
            | Dependency::Value { type_name, .. }
            | Dependency::Bean { type_name, .. } => *type_name,
            Dependency::Context => type_name::<BeanInstanceProvider>(),
        }
    }

    /// Configuration key, for value dependencies.
    pub fn key(&self) -> Option<&'static str> {
        match self {
            Dependency::Value { key, .. } => Some(*key),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dependency::Instance { type_name, .. } => {
                f.debug_tuple("Instance").field(type_name).finish()
            }
            Dependency::Value {
                key,
                required,
                type_name,
                ..
            } => f
                .debug_struct("Value")
                .field("key", key)
                .field("required", required)
                .field("type_name", type_name)
                .finish(),
            Dependency::Bean { type_name, .. } => f.debug_tuple("Bean").field(type_name).finish(),
            Dependency::Context => f.write_str("Context"),
        }
    }
}

/// One member of a bean that receives a dependency.
#[derive(Debug, Clone, Copy)]
pub struct InjectionPoint {
    member: &'static str,
    kind: InjectionKind,
    dependency: Dependency,
}

impl InjectionPoint {
    pub fn new(member: &'static str, kind: InjectionKind, dependency: Dependency) -> Self {
        Self {
            member,
            kind,
            dependency,
        }
    }

    pub fn member(&self) -> &'static str {
        self.member
    }

    pub fn kind(&self) -> InjectionKind {
        self.kind
    }

    pub fn dependency(&self) -> &Dependency {
        &self.dependency
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, InjectionKind::Constructor { .. })
    }

    /// Unbox a resolved value into the type the member expects.
    pub fn unpack<X: 'static>(&self, owner: &'static str, value: Resolved) -> Result<X> {
        value.downcast::<X>().map(|value| *value).map_err(|_| {
            Error::injection_access(
                owner,
                self.member,
                format!(
                    "resolved `{}` cannot be written as `{}`",
                    self.dependency.type_name(),
                    type_name::<X>()
                ),
            )
        })
    }

    pub(crate) fn resolve(
        &self,
        provider: &BeanInstanceProvider,
        owner: &'static str,
    ) -> Result<Resolved> {
        trace!(bean = owner, member = self.member, kind = ?self.kind, "Resolving injection point");
        match self.dependency {
            Dependency::Instance { resolve, .. } => resolve(provider),
            Dependency::Bean { create, .. } => create(provider),
            Dependency::Value { key, resolve, .. } => {
                resolve(provider, key)?.ok_or_else(|| Error::MissingValue {
                    type_name: owner,
                    member: self.member,
                    key: key.to_string(),
                })
            }
            Dependency::Context => Ok(Box::new(provider.clone()) as Resolved),
        }
    }
}

/// Injection metadata for one bean type.
#[derive(Debug, Clone)]
pub struct BeanDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    construction: Construction,
    points: Vec<InjectionPoint>,
}

impl BeanDescriptor {
    pub fn new<B: 'static>(construction: Construction) -> Self {
        Self {
            type_id: TypeId::of::<B>(),
            type_name: type_name::<B>(),
            construction,
            points: Vec::new(),
        }
    }

    pub fn with_point(mut self, point: InjectionPoint) -> Self {
        self.points.push(point);
        self
    }

    pub fn bean_type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn construction(&self) -> Construction {
        self.construction
    }

    pub fn is_instantiable(&self) -> bool {
        self.construction != Construction::Abstract
    }

    pub fn points(&self) -> &[InjectionPoint] {
        &self.points
    }

    pub fn point(&self, member: &str) -> Option<&InjectionPoint> {
        self.points.iter().find(|point| point.member == member)
    }

    /// Constructor points ordered by position.
    pub fn constructor_points(&self) -> Vec<&InjectionPoint> {
        let mut points: Vec<_> = self.points.iter().filter(|p| p.is_constructor()).collect();
        points.sort_by_key(|point| match point.kind {
            InjectionKind::Constructor { position } => position,
            _ => usize::MAX,
        });
        points
    }

    /// Field and setter points in declaration order.
    pub fn member_points(&self) -> impl Iterator<Item = &InjectionPoint> {
        self.points.iter().filter(|point| !point.is_constructor())
    }

    /// Check that every member appears once and constructor positions
    /// run `0..n` without gaps.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for point in &self.points {
            if !seen.insert(point.member) {
                return Err(Error::invalid_target(
                    self.type_name,
                    format!("member `{}` declared more than once", point.member),
                ));
            }
        }

        for (expected, point) in self.constructor_points().into_iter().enumerate() {
            if let InjectionKind::Constructor { position } = point.kind {
                if position != expected {
                    return Err(Error::invalid_target(
                        self.type_name,
                        format!(
                            "constructor parameter `{}` at position {} (expected {})",
                            point.member, position, expected
                        ),
                    ));
                }
            }
        }

        Ok(())
    }
}

static DESCRIPTORS: Lazy<RwLock<HashMap<TypeId, Arc<BeanDescriptor>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// The validated, cached descriptor of `B`.
pub fn descriptor_of<B: Bean>() -> Result<Arc<BeanDescriptor>> {
    let type_id = TypeId::of::<B>();
    if let Some(descriptor) = DESCRIPTORS.read().get(&type_id) {
        return Ok(Arc::clone(descriptor));
    }

    let descriptor = B::descriptor();
    descriptor.validate()?;

    debug!(
        bean = descriptor.type_name,
        points = descriptor.points.len(),
        "Built bean descriptor"
    );

    let mut descriptors = DESCRIPTORS.write();
    let cached = descriptors
        .entry(type_id)
        .or_insert_with(|| Arc::new(descriptor));
    Ok(Arc::clone(cached))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::Arguments;

    trait Store: Send + Sync {}

    struct Sample;

    impl Bean for Sample {
        fn descriptor() -> BeanDescriptor {
            BeanDescriptor::new::<Self>(Construction::Constructor("new"))
                .with_point(InjectionPoint::new(
                    "timeout",
                    InjectionKind::Constructor { position: 1 },
                    Dependency::value::<u64>("sample.timeout"),
                ))
                .with_point(InjectionPoint::new(
                    "store",
                    InjectionKind::Field,
                    Dependency::instance::<dyn Store>(),
                ))
                .with_point(InjectionPoint::new(
                    "name",
                    InjectionKind::Constructor { position: 0 },
                    Dependency::optional_value::<String>("sample.name"),
                ))
        }

        fn construct(_args: Arguments) -> Result<Self> {
            Ok(Sample)
        }

        fn inject(&mut self, _point: &InjectionPoint, _value: Resolved) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_constructor_points_sorted() {
        let descriptor = Sample::descriptor();
        let members: Vec<_> = descriptor
            .constructor_points()
            .iter()
            .map(|point| point.member())
            .collect();
        assert_eq!(members, vec!["name", "timeout"]);

        let members: Vec<_> = descriptor.member_points().map(|p| p.member()).collect();
        assert_eq!(members, vec!["store"]);
    }

    #[test]
    fn test_dependency_metadata() {
        let descriptor = Sample::descriptor();
        let timeout = descriptor.point("timeout").unwrap();
        assert_eq!(timeout.dependency().key(), Some("sample.timeout"));
        assert_eq!(timeout.dependency().type_name(), "u64");

        let store = descriptor.point("store").unwrap();
        assert_eq!(store.kind(), InjectionKind::Field);
        assert!(store.dependency().type_name().contains("Store"));
        assert_eq!(store.dependency().key(), None);
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let descriptor = BeanDescriptor::new::<Sample>(Construction::Default)
            .with_point(InjectionPoint::new(
                "store",
                InjectionKind::Field,
                Dependency::instance::<dyn Store>(),
            ))
            .with_point(InjectionPoint::new(
                "store",
                InjectionKind::Setter {
                    method: "set_store",
                },
                Dependency::instance::<dyn Store>(),
            ));

        let err = descriptor.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidTarget { .. }));
    }

    #[test]
    fn test_validate_rejects_position_gap() {
        let descriptor = BeanDescriptor::new::<Sample>(Construction::Constructor("new"))
            .with_point(InjectionPoint::new(
                "store",
                InjectionKind::Constructor { position: 1 },
                Dependency::instance::<dyn Store>(),
            ));

        assert!(descriptor.validate().is_err());
    }

    #[test]
    fn test_descriptor_cached() {
        let first = descriptor_of::<Sample>().unwrap();
        let second = descriptor_of::<Sample>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.bean_type_id(), TypeId::of::<Sample>());
        assert!(first.is_instantiable());
    }

    #[test]
    fn test_unpack_mismatch() {
        let point = InjectionPoint::new("count", InjectionKind::Field, Dependency::value::<u32>("n"));
        let value: Resolved = Box::new(5u32);
        assert_eq!(point.unpack::<u32>("Owner", value).unwrap(), 5);

        let value: Resolved = Box::new(5u32);
        let err = point.unpack::<String>("Owner", value).unwrap_err();
        assert!(matches!(err, Error::InjectionAccess { member: "count", .. }));
    }
}
