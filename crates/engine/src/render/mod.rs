//! Lazy, memoized render records.
//!
//! The first request for an app constructs its content through the backend,
//! wraps it in a container and, when the app declares a non-detached parent,
//! nests the content inside an anchor shell. Later requests return the same
//! record; apps update their content themselves.

mod anchor;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use appforge_registry::{AppDescriptor, AppRegistry};
use rustc_hash::FxHashMap;

use crate::backend::{AppContext, AppKey, RenderBackend};
use crate::error::Result;
use crate::scale::PxScale;

/// The nesting shell currently hosting an app's content.
#[derive(Debug, Clone)]
pub struct Anchor<N> {
	/// App whose recipe produced the shell.
	pub parent: Box<str>,
	pub shell: N,
}

/// Render output of one app.
///
/// Owned by the [`RenderCache`]. The anchor may be replaced in place; the
/// container and content never change once built.
pub struct RenderRecord<N> {
	pub key: AppKey,
	/// Stable outer node.
	pub container: N,
	/// The app's own rendered output.
	pub content: N,
	anchor: RefCell<Option<Anchor<N>>>,
}

impl<N: Clone> RenderRecord<N> {
	pub fn anchor(&self) -> Option<Anchor<N>> {
		self.anchor.borrow().clone()
	}

	pub fn is_anchored(&self) -> bool {
		self.anchor.borrow().is_some()
	}
}

impl<N: fmt::Debug> fmt::Debug for RenderRecord<N> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RenderRecord")
			.field("key", &self.key)
			.field("container", &self.container)
			.field("content", &self.content)
			.field("anchor", &self.anchor.borrow())
			.finish()
	}
}

/// Everything a construction needs besides the cache itself.
pub struct BuildCx<'a, B: RenderBackend> {
	pub backend: &'a mut B,
	pub registry: &'a AppRegistry<B::Factory>,
	pub props: &'a B::Props,
	pub scale: PxScale,
}

pub struct RenderCache<N> {
	records: FxHashMap<AppKey, Rc<RenderRecord<N>>>,
	materializations: u64,
	hits: u64,
}

impl<N> Default for RenderCache<N> {
	fn default() -> Self {
		Self {
			records: FxHashMap::default(),
			materializations: 0,
			hits: 0,
		}
	}
}

impl<N: Clone> RenderCache<N> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, key: &AppKey) -> Option<Rc<RenderRecord<N>>> {
		self.records.get(key).cloned()
	}

	/// Number of records built so far.
	pub fn materializations(&self) -> u64 {
		self.materializations
	}

	/// Number of requests served from the cache.
	pub fn hits(&self) -> u64 {
		self.hits
	}

	/// Returns the record for `descriptor`, building it on first request.
	///
	/// The declared parent is validated before anything is constructed, so a
	/// configuration error leaves the backend untouched.
	pub fn materialize<B>(&mut self, cx: &mut BuildCx<'_, B>, descriptor: &AppDescriptor<B::Factory>) -> Result<Rc<RenderRecord<N>>>
	where
		B: RenderBackend<Node = N>,
	{
		let key = AppKey::of(descriptor);
		if let Some(record) = self.records.get(&key) {
			self.hits += 1;
			tracing::trace!(target: "appforge::render", app = %key, "Reusing existing render record");
			return Ok(record.clone());
		}

		let parent = anchor::resolve_parent(cx.registry, descriptor)?;
		let _span = tracing::debug_span!(target: "appforge::render", "materialize", app = %key).entered();

		let ctx = AppContext::new(descriptor, cx.props, cx.scale);
		let content = cx.backend.construct(&descriptor.factory, &ctx);
		let container = cx.backend.container(&key);
		let record = Rc::new(RenderRecord {
			key: key.clone(),
			container,
			content,
			anchor: RefCell::new(None),
		});

		match parent.filter(|_| descriptor.anchor_parent().is_some()) {
			Some(parent) => anchor::attach(cx, &record, parent),
			None => cx.backend.reparent(&record.content, Some(&record.container)),
		}

		self.records.insert(key, record.clone());
		self.materializations += 1;
		tracing::debug!(target: "appforge::render", app = %record.key, "Materialized app");
		Ok(record)
	}

	/// Re-runs anchoring for an already materialized app, replacing its shell.
	///
	/// Apps that were never materialized are materialized instead; apps
	/// without a non-detached parent are returned unchanged.
	pub fn anchor<B>(&mut self, cx: &mut BuildCx<'_, B>, descriptor: &AppDescriptor<B::Factory>) -> Result<Rc<RenderRecord<N>>>
	where
		B: RenderBackend<Node = N>,
	{
		let Some(record) = self.get(&AppKey::of(descriptor)) else {
			return self.materialize(cx, descriptor);
		};

		let parent = anchor::resolve_parent(cx.registry, descriptor)?;
		match parent.filter(|_| descriptor.anchor_parent().is_some()) {
			Some(parent) => anchor::attach(cx, &record, parent),
			None => {
				tracing::trace!(target: "appforge::render", app = %record.key, "No anchor parent declared");
			}
		}
		Ok(record)
	}

	/// Applies a layering hint to a materialized app.
	///
	/// Layering is cosmetic: an app that was never materialized is logged and
	/// skipped.
	pub fn set_layer<B>(&self, backend: &mut B, key: &AppKey, z_index: i32)
	where
		B: RenderBackend<Node = N>,
	{
		match self.records.get(key) {
			Some(record) => backend.set_layer(&record.container, z_index),
			None => {
				tracing::warn!(target: "appforge::render", app = %key, z_index, "Cannot set layer on an app that was never materialized");
			}
		}
	}
}
