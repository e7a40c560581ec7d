// Procedural macros for beanbox
// Generate injection descriptors so beans need no hand-written glue

use proc_macro::TokenStream;

mod bean;

/// Derives `beanbox::Bean` from field attributes.
///
/// Struct attributes:
///
/// - `#[bean(constructor = new)]` - build through `Self::new(..)`, passing
///   the constructor members in declaration order
/// - `#[bean(abstract)]` - the type cannot be created
/// - `#[bean(context_aware)]` - hand the provider to `ContextAware::set_context`
///
/// Field attributes:
///
/// - `#[inject]` - field injection; the member is an `Inject<T>`, `Arc<T>` or
///   `Option<Arc<T>>`
/// - `#[inject(setter = set_x)]` - call `self.set_x(Arc<T>)`
/// - `#[inject(constructor)]` - pass as constructor parameter
/// - `#[inject(bean)]` - build the member as a nested bean
/// - `#[value("key")]` - fill from the value registry; `Option<V>` members
///   are optional, others require the key. Accepts `setter = ..` and
///   `constructor` like `#[inject]`.
///
/// Members without an attribute start from `Default::default()`.
#[proc_macro_derive(Bean, attributes(bean, inject, value))]
pub fn derive_bean(input: TokenStream) -> TokenStream {
    bean::bean_derive_impl(input)
}
