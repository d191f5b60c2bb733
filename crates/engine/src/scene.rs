//! Headless retained node tree implementing [`RenderBackend`].
//!
//! Hosts without a real UI toolkit (servers, snapshot tests, previews) can
//! render into a [`SceneTree`] and inspect the resulting hierarchy.

use std::fmt::{self, Write as _};
use std::marker::PhantomData;
use std::rc::Rc;

use slab::Slab;

use crate::backend::{AppContext, AppKey, RenderBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct SceneNode {
	pub label: String,
	pub parent: Option<NodeId>,
	pub children: Vec<NodeId>,
	pub layer: Option<i32>,
}

#[derive(Debug, Default)]
pub struct SceneTree {
	nodes: Slab<SceneNode>,
}

impl SceneTree {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a detached node.
	pub fn create(&mut self, label: impl Into<String>) -> NodeId {
		NodeId(self.nodes.insert(SceneNode {
			label: label.into(),
			parent: None,
			children: Vec::new(),
			layer: None,
		}))
	}

	/// Creates a node under `parent`.
	pub fn create_child(&mut self, parent: NodeId, label: impl Into<String>) -> NodeId {
		let id = self.create(label);
		self.reparent(id, Some(parent));
		id
	}

	pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
		self.nodes.get(id.0)
	}

	pub fn contains(&self, id: NodeId) -> bool {
		self.nodes.contains(id.0)
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	pub fn label(&self, id: NodeId) -> Option<&str> {
		self.node(id).map(|node| node.label.as_str())
	}

	pub fn parent(&self, id: NodeId) -> Option<NodeId> {
		self.node(id).and_then(|node| node.parent)
	}

	pub fn children(&self, id: NodeId) -> &[NodeId] {
		self.node(id).map_or(&[], |node| node.children.as_slice())
	}

	pub fn layer(&self, id: NodeId) -> Option<i32> {
		self.node(id).and_then(|node| node.layer)
	}

	/// First child of `id` carrying `label`.
	pub fn find_child(&self, id: NodeId, label: &str) -> Option<NodeId> {
		self.children(id)
			.iter()
			.copied()
			.find(|child| self.label(*child) == Some(label))
	}

	/// Returns true if `ancestor` is `id` or one of its ancestors.
	pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
		let mut current = Some(id);
		while let Some(node) = current {
			if node == ancestor {
				return true;
			}
			current = self.parent(node);
		}
		false
	}

	/// Moves `id` under `parent`, or detaches it.
	///
	/// Moves that would create a cycle or reference a missing node are ignored.
	pub fn reparent(&mut self, id: NodeId, parent: Option<NodeId>) {
		if !self.contains(id) {
			tracing::warn!(?id, "Reparenting a node that does not exist");
			return;
		}
		if let Some(parent) = parent
			&& (!self.contains(parent) || self.is_ancestor(id, parent))
		{
			tracing::warn!(?id, ?parent, "Refusing to reparent node");
			return;
		}

		if let Some(old) = self.nodes[id.0].parent.take() {
			self.nodes[old.0].children.retain(|child| *child != id);
		}
		if let Some(parent) = parent {
			self.nodes[parent.0].children.push(id);
			self.nodes[id.0].parent = Some(parent);
		}
	}

	/// Removes every descendant of `id`, keeping `id` itself.
	pub fn destroy_descendants(&mut self, id: NodeId) {
		let Some(node) = self.nodes.get_mut(id.0) else {
			return;
		};
		let mut stack = std::mem::take(&mut node.children);
		while let Some(child) = stack.pop() {
			if let Some(removed) = self.nodes.try_remove(child.0) {
				stack.extend(removed.children);
			}
		}
	}

	/// Detaches `id` and removes it with all of its descendants.
	pub fn destroy(&mut self, id: NodeId) {
		if !self.contains(id) {
			return;
		}
		self.reparent(id, None);
		self.destroy_descendants(id);
		self.nodes.remove(id.0);
	}

	pub fn set_layer(&mut self, id: NodeId, layer: i32) {
		if let Some(node) = self.nodes.get_mut(id.0) {
			node.layer = Some(layer);
		}
	}

	/// Indented outline of the subtree rooted at `root`, one label per line.
	pub fn outline(&self, root: NodeId) -> String {
		let mut out = String::new();
		self.write_outline(&mut out, root, 0);
		out
	}

	fn write_outline(&self, out: &mut String, id: NodeId, depth: usize) {
		let Some(node) = self.node(id) else {
			return;
		};
		let _ = write!(out, "{:indent$}{}", "", node.label, indent = depth * 2);
		if let Some(layer) = node.layer {
			let _ = write!(out, " [z={layer}]");
		}
		out.push('\n');
		for child in &node.children {
			self.write_outline(out, *child, depth + 1);
		}
	}
}

/// Factory type stored in the registry for the scene backend.
pub type SceneFactory<P> = Rc<dyn Fn(&mut SceneTree, &AppContext<'_, P>) -> NodeId>;

/// Wraps a closure as a [`SceneFactory`].
pub fn scene_factory<P>(f: impl Fn(&mut SceneTree, &AppContext<'_, P>) -> NodeId + 'static) -> SceneFactory<P> {
	Rc::new(f)
}

/// [`RenderBackend`] rendering into a [`SceneTree`].
pub struct SceneBackend<P = ()> {
	pub tree: SceneTree,
	_props: PhantomData<fn(&P)>,
}

impl<P> Default for SceneBackend<P> {
	fn default() -> Self {
		Self {
			tree: SceneTree::new(),
			_props: PhantomData,
		}
	}
}

impl<P> SceneBackend<P> {
	pub fn new() -> Self {
		Self::default()
	}
}

impl<P> fmt::Debug for SceneBackend<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SceneBackend").field("nodes", &self.tree.len()).finish()
	}
}

impl<P> RenderBackend for SceneBackend<P> {
	type Factory = SceneFactory<P>;
	type Node = NodeId;
	type Props = P;

	fn construct(&mut self, factory: &Self::Factory, ctx: &AppContext<'_, P>) -> NodeId {
		factory(&mut self.tree, ctx)
	}

	fn container(&mut self, key: &AppKey) -> NodeId {
		self.tree.create(&*key.name)
	}

	fn reparent(&mut self, node: &NodeId, parent: Option<&NodeId>) {
		self.tree.reparent(*node, parent.copied());
	}

	fn destroy_descendants(&mut self, node: &NodeId) {
		self.tree.destroy_descendants(*node);
	}

	fn destroy(&mut self, node: &NodeId) {
		self.tree.destroy(*node);
	}

	fn set_layer(&mut self, node: &NodeId, z_index: i32) {
		self.tree.set_layer(*node, z_index);
	}
}
