//! Capability interface to the host's render tree.
//!
//! The engine never inspects a node. It constructs app content from the
//! registry's opaque factories, wraps it in containers and moves nodes around
//! with the handful of operations below.

use std::fmt;

use appforge_registry::AppDescriptor;

use crate::scale::PxScale;

/// Identity of a materialized app: name × render group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppKey {
	pub name: Box<str>,
	pub group: Option<Box<str>>,
}

impl AppKey {
	pub fn of<F>(descriptor: &AppDescriptor<F>) -> Self {
		Self {
			name: descriptor.name.clone(),
			group: descriptor.group.clone(),
		}
	}
}

impl fmt::Display for AppKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.group {
			Some(group) => write!(f, "{}@{}", self.name, group),
			None => f.write_str(&self.name),
		}
	}
}

/// Context handed to an app factory on construction.
pub struct AppContext<'a, P> {
	pub name: &'a str,
	pub group: Option<&'a str>,
	/// Props supplied by whoever requested the render.
	pub props: &'a P,
	pub scale: PxScale,
}

impl<'a, P> AppContext<'a, P> {
	pub(crate) fn new<F>(descriptor: &'a AppDescriptor<F>, props: &'a P, scale: PxScale) -> Self {
		Self {
			name: descriptor.name(),
			group: descriptor.group_name(),
			props,
			scale,
		}
	}
}

/// Operations the engine needs from a render tree.
pub trait RenderBackend {
	/// Opaque construction recipe stored in the registry.
	type Factory;
	/// Handle to a node in the host tree.
	type Node: Clone + fmt::Debug;
	/// Caller props forwarded to factories.
	type Props;

	/// Runs `factory` and returns the root of the app's rendered output.
	fn construct(&mut self, factory: &Self::Factory, ctx: &AppContext<'_, Self::Props>) -> Self::Node;

	/// Creates the stable outer node for an app.
	fn container(&mut self, key: &AppKey) -> Self::Node;

	/// Moves `node` under `parent`, or detaches it when `parent` is `None`.
	fn reparent(&mut self, node: &Self::Node, parent: Option<&Self::Node>);

	fn destroy_descendants(&mut self, node: &Self::Node);

	/// Detaches `node` and releases it together with its descendants.
	fn destroy(&mut self, node: &Self::Node);

	/// Applies a layering hint. Purely cosmetic.
	fn set_layer(&mut self, node: &Self::Node, z_index: i32);
}
