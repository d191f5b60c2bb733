//! Declarative panel visibility and rendering.
//!
//! Hosts register their apps (independently visible UI units) in an
//! [`AppRegistry`], hand it to an [`AppForge`] together with a
//! [`RenderBackend`], and then drive everything through the forge:
//!
//! * visibility cells with equality-gated writes ([`AppForge::set`] and friends),
//! * rule cascades: closing a parent closes its children, opening a member of
//!   an exclusive group closes the other members,
//! * lazy, memoized render records with optional anchoring under a parent's
//!   recipe ([`AppForge::materialize`]),
//! * selection-based rendering that returns only top-level roots
//!   ([`AppForge::render`]).
//!
//! [`scene`] provides a headless backend for previews and tests.

mod backend;
mod config;
mod dispatch;
mod error;
mod forge;
mod render;
mod rules;
mod scale;
pub mod scene;
mod source;
mod visibility;

pub use appforge_registry::{
	AppDescriptor, AppRegistry, DanglingParent, ParentCycle, ParentLink, RegistryBuilder, RegistryError, RuleSet,
};
pub use backend::{AppContext, AppKey, RenderBackend};
pub use config::{ConfigError, ForgeConfig, HostMode};
pub use dispatch::{RenderRequest, Selection, resolve};
pub use error::{ConfigurationError, ForgeError, Result};
pub use forge::{AppForge, ForgeStats};
pub use render::{Anchor, RenderRecord};
pub use scale::{PxScale, ScaleConfig};
pub use source::{SharedSource, Subscription, VisibilitySource};
