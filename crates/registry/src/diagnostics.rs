//! Structural checks over a built registry.
//!
//! Nothing here rejects a registry. Cyclic parents are bounded at runtime by
//! the engine's reentrancy guard; these reports exist so hosts can surface the
//! misconfiguration.

use std::fmt;

use rustc_hash::FxHashSet;

use crate::index::AppRegistry;

/// A closed chain of `parent` declarations, e.g. `a -> b -> a`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParentCycle {
	/// Apps on the cycle, rotated so the smallest name comes first.
	pub apps: Vec<Box<str>>,
}

impl fmt::Display for ParentCycle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for app in &self.apps {
			write!(f, "{app} -> ")?;
		}
		match self.apps.first() {
			Some(first) => write!(f, "{first}"),
			None => Ok(()),
		}
	}
}

/// A `parent` declaration naming an app that is not registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingParent {
	pub child: Box<str>,
	pub parent: Box<str>,
}

impl<F> AppRegistry<F> {
	/// Returns every parent cycle once, self-parenting included.
	pub fn parent_cycles(&self) -> Vec<ParentCycle> {
		let mut seen = FxHashSet::default();
		let mut cycles = Vec::new();

		for start in self.names() {
			let mut path: Vec<&str> = Vec::new();
			let mut current = start;
			loop {
				if let Some(pos) = path.iter().position(|name| *name == current) {
					let cycle = canonical(&path[pos..]);
					if seen.insert(cycle.clone()) {
						cycles.push(cycle);
					}
					break;
				}
				let Some(descriptor) = self.lookup(current) else {
					break;
				};
				path.push(current);
				match descriptor.parent_name() {
					Some(parent) => current = parent,
					None => break,
				}
			}
		}

		cycles
	}

	/// Returns parent declarations whose target is not registered.
	pub fn dangling_parents(&self) -> Vec<DanglingParent> {
		self.iter()
			.filter_map(|app| {
				let parent = app.parent_name()?;
				(!self.contains(parent)).then(|| DanglingParent {
					child: app.name.clone(),
					parent: parent.into(),
				})
			})
			.collect()
	}
}

fn canonical(cycle: &[&str]) -> ParentCycle {
	let start = cycle
		.iter()
		.enumerate()
		.min_by_key(|(_, name)| **name)
		.map_or(0, |(idx, _)| idx);
	let apps = cycle[start..]
		.iter()
		.chain(&cycle[..start])
		.map(|name| Box::from(*name))
		.collect();
	ParentCycle { apps }
}
