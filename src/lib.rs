// beanbox - bean instance provider for unit tests
//
// Build the type under test with every injected collaborator filled in:
// registered instances, fabricated test doubles and named values.

// Re-export core functionality
pub use beanbox_core::*;

// Re-export the derive macro
#[cfg(feature = "derive")]
pub use beanbox_macro::Bean;
