//! Nesting a child app inside a shell borrowed from its parent's recipe.

use appforge_registry::{AppDescriptor, AppRegistry};

use super::{Anchor, BuildCx, RenderRecord};
use crate::backend::{AppContext, RenderBackend};
use crate::error::{ConfigurationError, Result};

/// Validates the declared parent of `descriptor`, detached or not.
pub(super) fn resolve_parent<'r, F>(
	registry: &'r AppRegistry<F>,
	descriptor: &AppDescriptor<F>,
) -> Result<Option<&'r AppDescriptor<F>>> {
	let Some(parent) = descriptor.parent_name() else {
		return Ok(None);
	};
	if parent == descriptor.name() {
		return Err(ConfigurationError::SelfParent(descriptor.name.clone()).into());
	}
	match registry.lookup(parent) {
		Some(parent) => Ok(Some(parent)),
		None => Err(ConfigurationError::MissingParent {
			app: descriptor.name.clone(),
			parent: parent.into(),
		}
		.into()),
	}
}

/// Places `record.content` inside a fresh shell built from `parent`.
///
/// The shell is the parent's rendered root with all of its descendants
/// destroyed. Any previous shell is destroyed so a record never holds more
/// than one.
pub(super) fn attach<B: RenderBackend>(
	cx: &mut BuildCx<'_, B>,
	record: &RenderRecord<B::Node>,
	parent: &AppDescriptor<B::Factory>,
) {
	let ctx = AppContext::new(parent, cx.props, cx.scale);
	let shell = cx.backend.construct(&parent.factory, &ctx);
	cx.backend.destroy_descendants(&shell);
	cx.backend.reparent(&record.content, Some(&shell));
	cx.backend.reparent(&shell, Some(&record.container));

	let previous = record.anchor.replace(Some(Anchor {
		parent: parent.name.clone(),
		shell,
	}));
	match previous {
		Some(previous) => {
			cx.backend.destroy(&previous.shell);
			tracing::debug!(
				target: "appforge::render",
				app = %record.key,
				parent = parent.name(),
				previous = &*previous.parent,
				"Replaced anchor shell"
			);
		}
		None => {
			tracing::debug!(target: "appforge::render", app = %record.key, parent = parent.name(), "Anchored under parent");
		}
	}
}
