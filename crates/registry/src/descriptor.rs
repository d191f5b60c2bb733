//! App descriptors and their declarative rule sets.

use std::fmt;

/// Declares that an app is nested under another app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
	/// Name of the parent app.
	pub name: Box<str>,
	/// Keeps the close cascade but skips visual nesting under the parent.
	pub detach: bool,
}

/// Declarative constraints attached to an app.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
	pub parent: Option<ParentLink>,
	/// At most one app per tag may be visible at a time.
	pub exclusive_group: Option<Box<str>>,
	/// Layering hint applied to the app's container.
	pub z_index: Option<i32>,
}

impl RuleSet {
	pub fn new() -> Self {
		Self::default()
	}

	/// Nests this app under `parent`, both for close cascades and anchoring.
	pub fn parent(mut self, parent: impl Into<Box<str>>) -> Self {
		self.parent = Some(ParentLink {
			name: parent.into(),
			detach: false,
		});
		self
	}

	/// Declares `parent` for close cascades only; the app is never anchored.
	pub fn detached_parent(mut self, parent: impl Into<Box<str>>) -> Self {
		self.parent = Some(ParentLink {
			name: parent.into(),
			detach: true,
		});
		self
	}

	pub fn exclusive(mut self, tag: impl Into<Box<str>>) -> Self {
		self.exclusive_group = Some(tag.into());
		self
	}

	pub fn z_index(mut self, z_index: i32) -> Self {
		self.z_index = Some(z_index);
		self
	}

	/// Returns the parent name, if any.
	pub fn parent_name(&self) -> Option<&str> {
		self.parent.as_ref().map(|link| &*link.name)
	}

	/// Returns the parent name only when the app should be anchored under it.
	pub fn anchor_parent(&self) -> Option<&str> {
		self.parent.as_ref().filter(|link| !link.detach).map(|link| &*link.name)
	}

	/// Returns the exclusive tag. Empty tags count as absent.
	pub fn exclusive_tag(&self) -> Option<&str> {
		self.exclusive_group.as_deref().filter(|tag| !tag.is_empty())
	}
}

/// Construction recipe and static configuration for one app.
///
/// `F` is the render backend's opaque factory; the registry never calls it.
pub struct AppDescriptor<F> {
	pub name: Box<str>,
	pub default_visible: bool,
	pub group: Option<Box<str>>,
	pub rules: Option<RuleSet>,
	pub factory: F,
}

impl<F> AppDescriptor<F> {
	pub fn new(name: impl Into<Box<str>>, factory: F) -> Self {
		Self {
			name: name.into(),
			default_visible: false,
			group: None,
			rules: None,
			factory,
		}
	}

	pub fn visible(mut self, visible: bool) -> Self {
		self.default_visible = visible;
		self
	}

	pub fn group(mut self, group: impl Into<Box<str>>) -> Self {
		self.group = Some(group.into());
		self
	}

	pub fn rules(mut self, rules: RuleSet) -> Self {
		self.rules = Some(rules);
		self
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn group_name(&self) -> Option<&str> {
		self.group.as_deref()
	}

	pub fn parent_name(&self) -> Option<&str> {
		self.rules.as_ref().and_then(RuleSet::parent_name)
	}

	pub fn anchor_parent(&self) -> Option<&str> {
		self.rules.as_ref().and_then(RuleSet::anchor_parent)
	}

	pub fn exclusive_tag(&self) -> Option<&str> {
		self.rules.as_ref().and_then(RuleSet::exclusive_tag)
	}

	pub fn z_index(&self) -> Option<i32> {
		self.rules.as_ref().and_then(|rules| rules.z_index)
	}
}

impl<F> fmt::Debug for AppDescriptor<F> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("AppDescriptor")
			.field("name", &self.name)
			.field("default_visible", &self.default_visible)
			.field("group", &self.group)
			.field("rules", &self.rules)
			.finish_non_exhaustive()
	}
}
