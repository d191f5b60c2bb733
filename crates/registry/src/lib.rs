//! Static registry of apps managed by the `appforge` engine.
//!
//! Each app is described once, by name, with its default visibility, optional
//! render group, declarative [`RuleSet`] and an opaque factory understood only
//! by the render backend. The registry is frozen after [`RegistryBuilder::build`]
//! and is read-only from then on.

mod descriptor;
mod diagnostics;
mod error;
mod index;

pub use descriptor::{AppDescriptor, ParentLink, RuleSet};
pub use diagnostics::{DanglingParent, ParentCycle};
pub use error::RegistryError;
pub use index::{AppRegistry, RegistryBuilder};
