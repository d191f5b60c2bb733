//! Resolving render selections into concrete app lists.

use appforge_registry::AppRegistry;
use indexmap::IndexSet;
use rustc_hash::FxBuildHasher;
use serde::Deserialize;

use crate::error::{ForgeError, Result};

/// Which apps a render request covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
	/// Every registered app, in registration order.
	#[default]
	All,
	App(Box<str>),
	Apps(Vec<Box<str>>),
	/// Apps belonging to any of the groups.
	Groups(Vec<Box<str>>),
	/// Apps belonging to any of the groups, restricted to `names`.
	GroupApps { groups: Vec<Box<str>>, names: Vec<Box<str>> },
}

impl Selection {
	pub fn app(name: impl Into<Box<str>>) -> Self {
		Self::App(name.into())
	}

	pub fn apps<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<Box<str>>,
	{
		Self::Apps(names.into_iter().map(Into::into).collect())
	}

	pub fn group(group: impl Into<Box<str>>) -> Self {
		Self::Groups(vec![group.into()])
	}

	pub fn groups<I, S>(groups: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<Box<str>>,
	{
		Self::Groups(groups.into_iter().map(Into::into).collect())
	}
}

/// Loose, deserializable form of [`Selection`].
///
/// `name`/`names` and `group`/`groups` are mutually exclusive. Names combined
/// with groups filter the groups' members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderRequest {
	pub name: Option<Box<str>>,
	pub names: Option<Vec<Box<str>>>,
	pub group: Option<Box<str>>,
	pub groups: Option<Vec<Box<str>>>,
}

impl TryFrom<RenderRequest> for Selection {
	type Error = ForgeError;

	fn try_from(request: RenderRequest) -> Result<Self> {
		let single_name = request.name.is_some();
		let names = match (request.name, request.names) {
			(Some(_), Some(_)) => return Err(ForgeError::ConflictingSelection("both `name` and `names` given")),
			(Some(name), None) => Some(vec![name]),
			(None, names) => names,
		};
		let groups = match (request.group, request.groups) {
			(Some(_), Some(_)) => return Err(ForgeError::ConflictingSelection("both `group` and `groups` given")),
			(Some(group), None) => Some(vec![group]),
			(None, groups) => groups,
		};

		Ok(match (groups, names) {
			(None, None) => Selection::All,
			(None, Some(mut names)) if single_name => Selection::App(names.remove(0)),
			(None, Some(names)) => Selection::Apps(names),
			(Some(groups), None) => Selection::Groups(groups),
			(Some(groups), Some(names)) => Selection::GroupApps { groups, names },
		})
	}
}

impl TryFrom<&RenderRequest> for Selection {
	type Error = ForgeError;

	fn try_from(request: &RenderRequest) -> Result<Self> {
		Selection::try_from(request.clone())
	}
}

type NameSet<'r> = IndexSet<&'r str, FxBuildHasher>;

/// Expands `selection` into the ordered, deduplicated list of apps to render.
///
/// Apps declaring a selected app as their parent are appended once; the
/// expansion is a single level, matching single-level parent declarations.
pub fn resolve<'r, F>(registry: &'r AppRegistry<F>, selection: &Selection) -> Result<Vec<&'r str>> {
	let selected = select(registry, selection)?;
	if selected.is_empty() {
		tracing::warn!(target: "appforge::render", ?selection, "Render selection resolved 0 apps");
		return Err(ForgeError::EmptySelection(format!("{selection:?}")));
	}

	let mut resolved = selected.clone();
	for app in registry.iter() {
		if app.parent_name().is_some_and(|parent| selected.contains(parent)) {
			resolved.insert(app.name());
		}
	}

	tracing::trace!(target: "appforge::render", ?selection, apps = ?resolved, "Resolved render selection");
	Ok(resolved.into_iter().collect())
}

fn select<'r, F>(registry: &'r AppRegistry<F>, selection: &Selection) -> Result<NameSet<'r>> {
	let known = |name: &str| -> Result<&'r str> {
		registry
			.lookup(name)
			.map(|app| app.name())
			.ok_or_else(|| ForgeError::UnknownApp(name.into()))
	};

	let mut set = NameSet::default();
	match selection {
		Selection::All => set.extend(registry.names()),
		Selection::App(name) => {
			set.insert(known(&**name)?);
		}
		Selection::Apps(names) => {
			for name in names {
				set.insert(known(&**name)?);
			}
		}
		Selection::Groups(groups) => set.extend(registry.in_groups(groups).map(|app| app.name())),
		Selection::GroupApps { groups, names } => {
			for name in names {
				known(&**name)?;
			}
			set.extend(
				registry
					.in_groups(groups)
					.map(|app| app.name())
					.filter(|name| names.iter().any(|n| &**n == *name)),
			);
		}
	}
	Ok(set)
}
