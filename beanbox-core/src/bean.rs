// Bean trait implemented by injection targets

use crate::descriptor::{BeanDescriptor, InjectionPoint};
use crate::{BeanContext, Error, Result};
use std::any::Any;
use std::collections::VecDeque;

/// A value resolved for an injection point, boxed as the type the point
/// declares: `Arc<T>` for instances, `V` or `Option<V>` for values, the bean
/// itself for nested beans and a [`BeanContext`] for context points.
pub type Resolved = Box<dyn Any>;

/// A type the provider can construct and inject.
///
/// Usually derived with `#[derive(Bean)]`:
///
/// ```ignore
/// #[derive(Bean)]
/// struct SignupService {
///     #[inject]
///     repository: Inject<dyn UserRepository>,
///     #[inject(setter = set_mailer)]
///     mailer: Option<Arc<dyn Mailer>>,
///     #[value("signup.welcome")]
///     welcome: Option<String>,
/// }
/// ```
pub trait Bean: Sized + 'static {
    /// Every injection point of the type. Called once per type; the
    /// result is cached.
    fn descriptor() -> BeanDescriptor;

    /// Build the instance from its resolved constructor parameters.
    fn construct(args: Arguments) -> Result<Self>;

    /// Write a resolved field or setter dependency into the instance.
    fn inject(&mut self, point: &InjectionPoint, value: Resolved) -> Result<()>;
}

/// Beans that want a handle to the provider that created them.
pub trait ContextAware {
    fn set_context(&mut self, context: BeanContext);
}

/// Resolved constructor parameters, consumed in position order.
pub struct Arguments {
    owner: &'static str,
    values: VecDeque<(&'static str, Resolved)>,
}

impl Arguments {
    pub fn new(owner: &'static str) -> Self {
        Self {
            owner,
            values: VecDeque::new(),
        }
    }

    pub(crate) fn push(&mut self, member: &'static str, value: Resolved) {
        self.values.push_back((member, value));
    }

    /// Take the next parameter, which must belong to `member`.
    pub fn take<X: 'static>(&mut self, member: &'static str) -> Result<X> {
        let (found, value) = self.values.pop_front().ok_or_else(|| {
            Error::injection_access(self.owner, member, "constructor parameter not resolved")
        })?;

        if found != member {
            return Err(Error::injection_access(
                self.owner,
                member,
                format!("next constructor parameter is `{found}`"),
            ));
        }

        value.downcast::<X>().map(|value| *value).map_err(|_| {
            Error::injection_access(
                self.owner,
                member,
                format!(
                    "constructor parameter is not a `{}`",
                    std::any::type_name::<X>()
                ),
            )
        })
    }

    pub fn owner(&self) -> &'static str {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl std::fmt::Debug for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let members: Vec<_> = self.values.iter().map(|(member, _)| *member).collect();
        f.debug_struct("Arguments")
            .field("owner", &self.owner)
            .field("members", &members)
            .finish()
    }
}
