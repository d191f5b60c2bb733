//! Insertion-ordered app registry and its builder.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::descriptor::AppDescriptor;
use crate::error::RegistryError;

type DescriptorMap<F> = IndexMap<Box<str>, AppDescriptor<F>, FxBuildHasher>;

/// Collects app descriptors before freezing them into an [`AppRegistry`].
pub struct RegistryBuilder<F> {
	apps: DescriptorMap<F>,
}

impl<F> Default for RegistryBuilder<F> {
	fn default() -> Self {
		Self {
			apps: IndexMap::default(),
		}
	}
}

impl<F> RegistryBuilder<F> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers one app.
	///
	/// Names are a single global namespace; empty and duplicate names are rejected.
	pub fn register(&mut self, descriptor: AppDescriptor<F>) -> Result<&mut Self, RegistryError> {
		if descriptor.name.is_empty() {
			tracing::error!(target: "appforge::lifecycle", ?descriptor, "Attempted to register app without a name");
			return Err(RegistryError::EmptyName);
		}
		if self.apps.contains_key(&descriptor.name) {
			tracing::error!(target: "appforge::lifecycle", app = %descriptor.name, "Duplicate app name detected");
			return Err(RegistryError::DuplicateName(descriptor.name));
		}

		tracing::trace!(target: "appforge::lifecycle", app = %descriptor.name, group = ?descriptor.group, "Registered app");
		self.apps.insert(descriptor.name.clone(), descriptor);
		Ok(self)
	}

	/// Builder-style [`register`](Self::register).
	pub fn with(mut self, descriptor: AppDescriptor<F>) -> Result<Self, RegistryError> {
		self.register(descriptor)?;
		Ok(self)
	}

	pub fn build(self) -> AppRegistry<F> {
		AppRegistry { apps: self.apps }
	}
}

/// Read-only mapping from app name to descriptor, iterated in registration order.
pub struct AppRegistry<F> {
	apps: DescriptorMap<F>,
}

impl<F> AppRegistry<F> {
	pub fn builder() -> RegistryBuilder<F> {
		RegistryBuilder::new()
	}

	#[inline]
	pub fn lookup(&self, name: &str) -> Option<&AppDescriptor<F>> {
		self.apps.get(name)
	}

	#[inline]
	pub fn contains(&self, name: &str) -> bool {
		self.apps.contains_key(name)
	}

	/// Registration position of `name`.
	pub fn position(&self, name: &str) -> Option<usize> {
		self.apps.get_index_of(name)
	}

	pub fn len(&self) -> usize {
		self.apps.len()
	}

	pub fn is_empty(&self) -> bool {
		self.apps.is_empty()
	}

	/// Iterates descriptors in registration order.
	pub fn iter(&self) -> impl Iterator<Item = &AppDescriptor<F>> {
		self.apps.values()
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.apps.keys().map(|name| &**name)
	}

	/// Calls `f(descriptor, name)` for every app in registration order.
	pub fn for_each(&self, mut f: impl FnMut(&AppDescriptor<F>, &str)) {
		for (name, descriptor) in &self.apps {
			f(descriptor, name);
		}
	}

	/// Apps declaring `parent` as their parent, detached or not.
	pub fn children_of<'a>(&'a self, parent: &str) -> impl Iterator<Item = &'a AppDescriptor<F>> {
		self.iter()
			.filter(move |app| app.parent_name() == Some(parent) && &*app.name != parent)
	}

	/// Apps whose group is one of `groups`.
	pub fn in_groups<'a, S: AsRef<str>>(&'a self, groups: &[S]) -> impl Iterator<Item = &'a AppDescriptor<F>> {
		self.iter().filter(move |app| {
			app.group_name()
				.is_some_and(|group| groups.iter().any(|g| g.as_ref() == group))
		})
	}

	/// Other apps sharing the exclusive tag of `name`.
	pub fn exclusive_peers<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a AppDescriptor<F>> {
		let tag = self.lookup(name).and_then(AppDescriptor::exclusive_tag);
		self.iter()
			.filter(move |app| tag.is_some() && &*app.name != name && app.exclusive_tag() == tag)
	}
}

impl<F> std::fmt::Debug for AppRegistry<F> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_list().entries(self.apps.values()).finish()
	}
}
