//! Bean instance provider for unit tests.
//!
//! Build the type under test with every injected collaborator filled in,
//! either with instances you registered or with automatically fabricated
//! test doubles, without test-only constructors or setters.
//!
//! ## Quick Start
//!
//! ```ignore
//! use beanbox_core::*;
//! use std::sync::Arc;
//!
//! register_mock!(dyn Mailer => MockMailer::new());
//!
//! let provider = BeanInstanceProvider::new();
//! provider.register_instance::<dyn UserRepository>(Arc::new(InMemoryUsers::default()));
//! provider.set_value("signup.welcome", "Hi!".to_string());
//!
//! let service = provider.create_bean::<SignupService>()?;
//! let mailer = provider.get_instance_of::<dyn Mailer>()?; // same double the service got
//! ```
//!
//! ## Injection Styles
//!
//! - **Field** - the member is assigned after construction
//! - **Setter** - a method is called with the dependency after construction
//! - **Constructor** - the dependency is passed to the constructor
//! - **Value** - the member is filled from the named value registry
//!
//! Each style is declared through the type's [`BeanDescriptor`], which is
//! normally generated by `#[derive(Bean)]` from the `beanbox-macro` crate.

mod bean;
mod error;
mod mock;
mod provider;
mod registry;
mod slot;
mod values;

pub mod config;
pub mod descriptor;
pub mod logging;

pub use bean::{Arguments, Bean, ContextAware, Resolved};
pub use config::{FileFormat, ProviderConfig, ValueSource};
pub use descriptor::{
    BeanDescriptor, Construction, Dependency, InjectionKind, InjectionPoint, descriptor_of,
};
pub use error::{Error, Result};
pub use mock::{Fabricated, MockFactory, Mockable, catalog_factory};
pub use provider::{BeanContext, BeanInstanceProvider};
pub use registry::InstanceRegistry;
pub use slot::Inject;
pub use values::ValueRegistry;

#[doc(hidden)]
pub use inventory;
