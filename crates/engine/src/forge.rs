//! The engine instance hosts talk to.
//!
//! [`AppForge`] wires the visibility store, rule engine, render cache and
//! dispatcher together around one injected registry and one render backend.
//! Every operation runs synchronously on the calling thread; cascades recurse
//! through [`AppForge::set`] and are bounded by the rule engine's guard.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use appforge_registry::{AppDescriptor, AppRegistry};
use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashMap};

use crate::backend::{AppKey, RenderBackend};
use crate::config::{ForgeConfig, HostMode};
use crate::dispatch::{self, RenderRequest, Selection};
use crate::error::{ForgeError, Result};
use crate::render::{BuildCx, RenderCache, RenderRecord};
use crate::rules::{RuleEngine, RuleHost};
use crate::scale::PxScale;
use crate::source::VisibilitySource;
use crate::visibility::VisibilityStore;

/// Counters exposed for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForgeStats {
	/// Rule evaluations that ran their rule bodies.
	pub evaluations: u64,
	/// Nested evaluations suppressed by the processing guard.
	pub skipped_reentrant: u64,
	/// Render records built.
	pub materializations: u64,
	/// Materialize requests served from the cache.
	pub cache_hits: u64,
}

pub struct AppForge<B: RenderBackend> {
	registry: Rc<AppRegistry<B::Factory>>,
	config: ForgeConfig,
	visibility: VisibilityStore,
	rules: RuleEngine,
	renders: RefCell<RenderCache<B::Node>>,
	backend: RefCell<B>,
	scale: Cell<PxScale>,
	batch_depth: Cell<usize>,
	/// Bound apps notified while a batch was open.
	pending: RefCell<IndexSet<Box<str>, FxBuildHasher>>,
}

impl<B: RenderBackend> AppForge<B> {
	/// Creates an engine over `registry`, initializing every visibility cell
	/// from its descriptor's default.
	///
	/// Cyclic and dangling parent declarations are logged, not rejected.
	pub fn new(registry: Rc<AppRegistry<B::Factory>>, backend: B, config: ForgeConfig) -> Rc<Self> {
		let visibility = VisibilityStore::new();
		registry.for_each(|descriptor, name| visibility.init(name, descriptor.default_visible));

		for cycle in registry.parent_cycles() {
			tracing::warn!(target: "appforge::lifecycle", %cycle, "Cyclic parent declaration; cascades stop at the first repeated app");
		}
		for dangling in registry.dangling_parents() {
			tracing::warn!(
				target: "appforge::lifecycle",
				app = &*dangling.child,
				parent = &*dangling.parent,
				"App declares an unregistered parent"
			);
		}
		tracing::info!(target: "appforge::lifecycle", apps = registry.len(), mode = ?config.mode, "Engine created");

		Rc::new(Self {
			registry,
			config,
			visibility,
			rules: RuleEngine::new(),
			renders: RefCell::new(RenderCache::new()),
			backend: RefCell::new(backend),
			scale: Cell::new(PxScale::default()),
			batch_depth: Cell::new(0),
			pending: RefCell::new(IndexSet::default()),
		})
	}

	/// Creates an engine with the configuration read from a TOML file.
	pub fn from_config_file(registry: Rc<AppRegistry<B::Factory>>, backend: B, path: impl AsRef<Path>) -> Result<Rc<Self>> {
		let config = ForgeConfig::load(path)?;
		Ok(Self::new(registry, backend, config))
	}

	pub fn registry(&self) -> &Rc<AppRegistry<B::Factory>> {
		&self.registry
	}

	pub fn config(&self) -> &ForgeConfig {
		&self.config
	}

	fn descriptor(&self, name: &str) -> Result<&AppDescriptor<B::Factory>> {
		self.registry.lookup(name).ok_or_else(|| ForgeError::UnknownApp(name.into()))
	}

	/// Current visibility of `name`.
	pub fn get(&self, name: &str) -> Result<bool> {
		let descriptor = self.descriptor(name)?;
		Ok(self.visibility.get_or_init(name, descriptor.default_visible))
	}

	/// Writes visibility and runs the rule cascade for `name`.
	pub fn set(&self, name: &str, value: bool) -> Result<()> {
		self.set_with(name, value, true)
	}

	/// Writes visibility, running the rule cascade only when `run_rules` is set.
	///
	/// Writing the current value has no effect at all.
	pub fn set_with(&self, name: &str, value: bool, run_rules: bool) -> Result<()> {
		self.descriptor(name)?;
		if !self.visibility.write(name, value) {
			tracing::trace!(target: "appforge::state", app = name, value, "Visibility unchanged");
			return Ok(());
		}

		tracing::debug!(target: "appforge::state", app = name, value, run_rules, "Visibility changed");
		if run_rules {
			self.rules.evaluate(self, name)?;
		}
		Ok(())
	}

	pub fn open(&self, name: &str) -> Result<()> {
		self.set_with(name, true, true)
	}

	pub fn open_with(&self, name: &str, run_rules: bool) -> Result<()> {
		self.set_with(name, true, run_rules)
	}

	pub fn close(&self, name: &str) -> Result<()> {
		self.set_with(name, false, true)
	}

	pub fn close_with(&self, name: &str, run_rules: bool) -> Result<()> {
		self.set_with(name, false, run_rules)
	}

	pub fn toggle(&self, name: &str) -> Result<()> {
		self.toggle_with(name, true)
	}

	pub fn toggle_with(&self, name: &str, run_rules: bool) -> Result<()> {
		let current = self.get(name)?;
		self.set_with(name, !current, run_rules)
	}

	/// Names of visible apps in registration order.
	pub fn visible_apps(&self) -> Vec<&str> {
		self.registry
			.iter()
			.filter(|app| self.visibility.get_or_init(app.name(), app.default_visible))
			.map(AppDescriptor::name)
			.collect()
	}

	/// Hands visibility of `name` to an external source.
	///
	/// Only available in [`HostMode::Preview`]. Each logical change of the
	/// source runs one rule evaluation; use [`batch`](Self::batch) to coalesce
	/// several source writes into one cascade per app.
	pub fn bind(self: &Rc<Self>, name: &str, source: Rc<dyn VisibilitySource>) -> Result<()>
	where
		B: 'static,
	{
		let descriptor = self.descriptor(name)?;
		if self.config.mode == HostMode::Live {
			tracing::warn!(target: "appforge::state", app = name, "Refusing to bind visibility while live");
			return Err(ForgeError::BindUnavailable(name.into()));
		}

		let forge = Rc::downgrade(self);
		let app = descriptor.name.clone();
		let subscription = source.subscribe(Rc::new(move || {
			if let Some(forge) = forge.upgrade() {
				forge.source_changed(&app);
			}
		}));

		let current = source.get();
		let previous = self.visibility.bind(name, source, subscription);
		tracing::debug!(target: "appforge::state", app = name, value = current, ?previous, "Bound external visibility source");
		if previous != Some(current) {
			self.rules.evaluate(&**self, name)?;
		}
		Ok(())
	}

	/// Returns ownership of `name` to the engine, keeping the source's last value.
	///
	/// Returns `false` when `name` was not bound.
	pub fn unbind(&self, name: &str) -> Result<bool> {
		self.descriptor(name)?;
		let unbound = self.visibility.unbind(name);
		if unbound {
			self.pending.borrow_mut().shift_remove(name);
			tracing::debug!(target: "appforge::state", app = name, "Unbound external visibility source");
		}
		Ok(unbound)
	}

	/// Whether rule evaluation for `name` is on the current call stack.
	pub fn is_evaluating(&self, name: &str) -> bool {
		self.rules.is_processing(name)
	}

	pub fn is_bound(&self, name: &str) -> bool {
		self.visibility.is_bound(name)
	}

	/// Runs `f` with source notifications deferred.
	///
	/// When the outermost batch closes, each bound app whose value differs
	/// from the last value a cascade ran for is evaluated once. The first
	/// cascade error is returned after all pending apps were processed.
	pub fn batch<R>(&self, f: impl FnOnce() -> R) -> Result<R> {
		let result = {
			let _scope = BatchScope::enter(&self.batch_depth);
			f()
		};
		if self.batch_depth.get() > 0 {
			return Ok(result);
		}

		let pending: Vec<Box<str>> = self.pending.borrow_mut().drain(..).collect();
		let mut outcome = Ok(result);
		for name in pending {
			if let Err(error) = self.flush_source(&name) {
				tracing::error!(target: "appforge::state", app = &*name, %error, "Deferred cascade failed");
				if outcome.is_ok() {
					outcome = Err(error);
				}
			}
		}
		outcome
	}

	fn source_changed(&self, name: &str) {
		if self.batch_depth.get() > 0 {
			tracing::trace!(target: "appforge::state", app = name, "Deferring source change until batch closes");
			self.pending.borrow_mut().insert(name.into());
			return;
		}
		if let Err(error) = self.flush_source(name) {
			tracing::error!(target: "appforge::state", app = name, %error, "Cascade after source change failed");
		}
	}

	fn flush_source(&self, name: &str) -> Result<()> {
		let Some(value) = self.visibility.observe(name) else {
			return Ok(());
		};
		tracing::debug!(target: "appforge::state", app = name, value, "External source changed");
		self.rules.evaluate(self, name)
	}

	/// Returns the cached render record for `name`, building it on first use.
	pub fn materialize(&self, name: &str, props: &B::Props) -> Result<Rc<RenderRecord<B::Node>>> {
		let descriptor = self.descriptor(name)?;
		let mut backend = self.backend.borrow_mut();
		let mut cx = self.build_cx(&mut backend, props);
		self.renders.borrow_mut().materialize(&mut cx, descriptor)
	}

	/// Rebuilds the anchor shell of `name`, replacing any previous one.
	pub fn anchor(&self, name: &str, props: &B::Props) -> Result<Rc<RenderRecord<B::Node>>> {
		let descriptor = self.descriptor(name)?;
		let mut backend = self.backend.borrow_mut();
		let mut cx = self.build_cx(&mut backend, props);
		self.renders.borrow_mut().anchor(&mut cx, descriptor)
	}

	fn build_cx<'a>(&'a self, backend: &'a mut B, props: &'a B::Props) -> BuildCx<'a, B> {
		BuildCx {
			backend,
			registry: &self.registry,
			props,
			scale: self.scale.get(),
		}
	}

	/// Cached record of `name`, if it was materialized.
	pub fn record(&self, name: &str) -> Result<Option<Rc<RenderRecord<B::Node>>>> {
		let descriptor = self.descriptor(name)?;
		Ok(self.renders.borrow().get(&AppKey::of(descriptor)))
	}

	/// Applies a layering hint to the container of `name`.
	///
	/// Apps that were never materialized are logged and skipped.
	pub fn set_layer(&self, name: &str, z_index: i32) -> Result<()> {
		let key = AppKey::of(self.descriptor(name)?);
		let mut backend = self.backend.borrow_mut();
		self.renders.borrow().set_layer(&mut *backend, &key, z_index);
		Ok(())
	}

	/// Materializes every app in `selection` and returns the top-level containers.
	///
	/// Children declaring a selected app as their parent are rendered along
	/// with it. An anchored child whose parent is part of the same render is
	/// mounted inside the parent's container and not returned.
	pub fn render(&self, selection: &Selection, props: &B::Props) -> Result<Vec<B::Node>> {
		let names = dispatch::resolve(&*self.registry, selection)?;
		let _span = tracing::debug_span!(target: "appforge::render", "render", apps = names.len()).entered();

		let mut backend = self.backend.borrow_mut();
		let mut built = Vec::with_capacity(names.len());
		{
			let mut cx = self.build_cx(&mut backend, props);
			let mut renders = self.renders.borrow_mut();
			for name in &names {
				let descriptor = self.descriptor(name)?;
				built.push((descriptor, renders.materialize(&mut cx, descriptor)?));
			}
		}

		let by_name: FxHashMap<&str, Rc<RenderRecord<B::Node>>> = built
			.iter()
			.map(|(descriptor, record)| (descriptor.name(), record.clone()))
			.collect();

		let mut roots = Vec::with_capacity(built.len());
		for (descriptor, record) in &built {
			let mount_under = descriptor.anchor_parent().and_then(|parent| by_name.get(parent));
			self.rules
				.present::<B>(descriptor, record, mount_under.map(|parent| &**parent), &mut *backend);
			if mount_under.is_none() {
				roots.push(record.container.clone());
			}
		}

		tracing::debug!(target: "appforge::render", roots = roots.len(), "Rendered selection");
		Ok(roots)
	}

	pub fn render_request(&self, request: &RenderRequest, props: &B::Props) -> Result<Vec<B::Node>> {
		let selection = Selection::try_from(request)?;
		self.render(&selection, props)
	}

	/// Renders `selection` and attaches every returned root under `root`.
	///
	/// Without a selection, the configured `render` request is used, falling
	/// back to every registered app.
	pub fn mount(&self, root: &B::Node, selection: Option<&Selection>, props: &B::Props) -> Result<Vec<B::Node>> {
		let selection = match (selection, &self.config.render) {
			(Some(selection), _) => selection.clone(),
			(None, Some(request)) => Selection::try_from(request)?,
			(None, None) => Selection::All,
		};

		let roots = self.render(&selection, props)?;
		let mut backend = self.backend.borrow_mut();
		for node in &roots {
			backend.reparent(node, Some(root));
		}
		tracing::info!(target: "appforge::lifecycle", roots = roots.len(), ?selection, "Mounted apps");
		Ok(roots)
	}

	/// Recomputes the responsive scale for a new viewport.
	///
	/// A viewport without area keeps the previous scale. Records built earlier
	/// keep the scale they were constructed with.
	pub fn resize(&self, width: f32, height: f32) -> PxScale {
		match PxScale::compute(&self.config.scale, width, height) {
			Some(scale) => {
				tracing::debug!(target: "appforge::px", width, height, factor = scale.factor(), "Recomputed scale");
				self.scale.set(scale);
			}
			None => {
				tracing::trace!(target: "appforge::px", width, height, "Ignoring viewport without area");
			}
		}
		self.scale.get()
	}

	pub fn scale(&self) -> PxScale {
		self.scale.get()
	}

	pub fn stats(&self) -> ForgeStats {
		let renders = self.renders.borrow();
		ForgeStats {
			evaluations: self.rules.evaluations(),
			skipped_reentrant: self.rules.skipped(),
			materializations: renders.materializations(),
			cache_hits: renders.hits(),
		}
	}

	/// Borrows the backend.
	///
	/// # Panics
	///
	/// Panics if called from inside an app factory.
	pub fn backend(&self) -> Ref<'_, B> {
		self.backend.borrow()
	}

	/// Mutably borrows the backend, e.g. to create a mount root.
	///
	/// # Panics
	///
	/// Panics if called from inside an app factory.
	pub fn backend_mut(&self) -> RefMut<'_, B> {
		self.backend.borrow_mut()
	}
}

impl<B: RenderBackend> RuleHost for AppForge<B> {
	type Factory = B::Factory;

	fn registry(&self) -> &AppRegistry<B::Factory> {
		&self.registry
	}

	fn is_visible(&self, name: &str) -> Result<bool> {
		self.get(name)
	}

	fn set_visible(&self, name: &str, value: bool) -> Result<()> {
		self.set(name, value)
	}
}

impl<B: RenderBackend> fmt::Debug for AppForge<B> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AppForge")
			.field("apps", &self.registry.len())
			.field("mode", &self.config.mode)
			.field("scale", &self.scale.get())
			.field("stats", &self.stats())
			.finish_non_exhaustive()
	}
}

/// Open batch, closed on drop.
struct BatchScope<'a> {
	depth: &'a Cell<usize>,
}

impl<'a> BatchScope<'a> {
	fn enter(depth: &'a Cell<usize>) -> Self {
		depth.set(depth.get() + 1);
		Self { depth }
	}
}

impl Drop for BatchScope<'_> {
	fn drop(&mut self) {
		self.depth.set(self.depth.get() - 1);
	}
}
