//! Visibility rule evaluation.
//!
//! Every visibility change runs a fixed sequence of rules for the app that
//! changed: first the parent cascade, then the exclusive group. Rules react one
//! level at a time; closing a child goes back through `set`, which evaluates
//! the child's own rules. Transitive behavior falls out of that recursion.
//!
//! A per-app processing set makes a nested evaluation of an app that is
//! already being evaluated a no-op. This is what bounds misconfigured cyclic
//! parent chains: the cascade stops once it reaches an app already on the
//! stack.

mod exclusive;
mod parent;

use std::cell::{Cell, RefCell};

use appforge_registry::{AppDescriptor, AppRegistry};
use rustc_hash::FxHashSet;

use crate::backend::RenderBackend;
use crate::error::{ForgeError, Result};
use crate::render::RenderRecord;

/// What the rule bodies need from their owner.
pub trait RuleHost {
	type Factory;

	fn registry(&self) -> &AppRegistry<Self::Factory>;

	fn is_visible(&self, name: &str) -> Result<bool>;

	/// Writes visibility and runs rules for `name` if it changed.
	fn set_visible(&self, name: &str, value: bool) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct RuleEngine {
	processing: RefCell<FxHashSet<Box<str>>>,
	evaluations: Cell<u64>,
	skipped: Cell<u64>,
}

impl RuleEngine {
	pub fn new() -> Self {
		Self::default()
	}

	/// Runs the cascade rules for `name`.
	///
	/// Fails with [`ForgeError::UnknownApp`] when `name` is not registered.
	/// Errors raised by nested cascades abort the remaining rules but always
	/// release `name` from the processing set.
	pub fn evaluate<H: RuleHost + ?Sized>(&self, host: &H, name: &str) -> Result<()> {
		if !host.registry().contains(name) {
			return Err(ForgeError::UnknownApp(name.into()));
		}

		let Some(_guard) = ProcessingGuard::enter(&self.processing, name) else {
			self.skipped.set(self.skipped.get() + 1);
			tracing::trace!(target: "appforge::rules", app = name, "Skipped rule processing (already evaluating)");
			return Ok(());
		};

		self.evaluations.set(self.evaluations.get() + 1);
		tracing::trace!(target: "appforge::rules", app = name, "Evaluating rules");

		parent::cascade(name, host)?;
		exclusive::cascade(name, host)?;
		Ok(())
	}

	/// Applies presentation-only rule effects to a materialized app.
	///
	/// `mount_under` is the parent's record when the app should be nested in
	/// the parent's container. An anchored app presented without it is
	/// detached from any parent container an earlier render mounted it in.
	/// Visibility is never touched here.
	pub fn present<B: RenderBackend>(
		&self,
		descriptor: &AppDescriptor<B::Factory>,
		record: &RenderRecord<B::Node>,
		mount_under: Option<&RenderRecord<B::Node>>,
		backend: &mut B,
	) {
		if let Some(parent) = mount_under {
			tracing::trace!(target: "appforge::rules", app = descriptor.name(), "Mounting under parent container");
			backend.reparent(&record.container, Some(&parent.container));
		} else if descriptor.anchor_parent().is_some() {
			tracing::trace!(target: "appforge::rules", app = descriptor.name(), "Presenting anchored app as a root");
			backend.reparent(&record.container, None);
		}
		if let Some(z_index) = descriptor.z_index() {
			tracing::trace!(target: "appforge::rules", app = descriptor.name(), z_index, "Applying z-index");
			backend.set_layer(&record.container, z_index);
		}
	}

	pub fn is_processing(&self, name: &str) -> bool {
		self.processing.borrow().contains(name)
	}

	pub fn evaluations(&self) -> u64 {
		self.evaluations.get()
	}

	pub fn skipped(&self) -> u64 {
		self.skipped.get()
	}
}

/// Membership of one app in the processing set, released on drop.
struct ProcessingGuard<'a> {
	set: &'a RefCell<FxHashSet<Box<str>>>,
	name: Box<str>,
}

impl<'a> ProcessingGuard<'a> {
	fn enter(set: &'a RefCell<FxHashSet<Box<str>>>, name: &str) -> Option<Self> {
		let name: Box<str> = name.into();
		if !set.borrow_mut().insert(name.clone()) {
			return None;
		}
		Some(Self { set, name })
	}
}

impl Drop for ProcessingGuard<'_> {
	fn drop(&mut self) {
		let removed = self.set.borrow_mut().remove(&self.name);
		debug_assert!(removed, "processing entry for {:?} vanished", self.name);
	}
}
