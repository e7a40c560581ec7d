// Field slot for dependencies injected after construction

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Holder for a field-injected dependency.
///
/// Starts empty when the bean is constructed and is filled by
/// [`BeanInstanceProvider::create_bean`](crate::BeanInstanceProvider::create_bean).
/// Dereferencing an empty slot panics, the same way an unset collaborator
/// fails a test as soon as it is used.
pub struct Inject<T: ?Sized>(Option<Arc<T>>);

impl<T: ?Sized> Inject<T> {
    pub fn empty() -> Self {
        Inject(None)
    }

    pub fn is_injected(&self) -> bool {
        self.0.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.0.as_deref()
    }

    /// The shared instance, for identity checks or handing on.
    pub fn arc(&self) -> Option<Arc<T>> {
        self.0.clone()
    }

    pub fn set(&mut self, instance: Arc<T>) {
        self.0 = Some(instance);
    }
}

impl<T: ?Sized> Default for Inject<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> Clone for Inject<T> {
    fn clone(&self) -> Self {
        Inject(self.0.clone())
    }
}

impl<T: ?Sized> From<Arc<T>> for Inject<T> {
    fn from(instance: Arc<T>) -> Self {
        Inject(Some(instance))
    }
}

impl<T: ?Sized> Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match &self.0 {
            Some(instance) => instance.as_ref(),
            None => panic!(
                "`{}` used before it was injected",
                std::any::type_name::<T>()
            ),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("type_name", &std::any::type_name::<T>())
            .field("injected", &self.is_injected())
            .finish()
    }
}
