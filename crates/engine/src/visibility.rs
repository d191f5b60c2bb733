//! One boolean visibility cell per app.
//!
//! The store only records values. Name validation and rule cascades live in
//! [`AppForge`](crate::AppForge), which funnels every write through `set`.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::source::{Subscription, VisibilitySource};

struct Binding {
	source: Rc<dyn VisibilitySource>,
	/// Last value a cascade was run for (or written by the engine itself).
	last_seen: bool,
	_subscription: Subscription,
}

enum VisibilityCell {
	Owned(bool),
	Bound(Binding),
}

#[derive(Default)]
pub struct VisibilityStore {
	cells: RefCell<FxHashMap<Box<str>, VisibilityCell>>,
}

impl VisibilityStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates the cell for `name` unless it already exists.
	pub fn init(&self, name: &str, default_visible: bool) {
		self.cells
			.borrow_mut()
			.entry(name.into())
			.or_insert(VisibilityCell::Owned(default_visible));
	}

	/// Reads the cell, initializing it to `default_visible` on first access.
	pub fn get_or_init(&self, name: &str, default_visible: bool) -> bool {
		let source = {
			let mut cells = self.cells.borrow_mut();
			let cell = cells
				.entry(name.into())
				.or_insert(VisibilityCell::Owned(default_visible));
			match cell {
				VisibilityCell::Owned(value) => return *value,
				VisibilityCell::Bound(binding) => binding.source.clone(),
			}
		};
		source.get()
	}

	/// Writes `value`, returning whether the cell changed.
	///
	/// Bound cells forward the write to their source after recording it as seen,
	/// so the source's change notification does not cascade a second time.
	pub fn write(&self, name: &str, value: bool) -> bool {
		let source = {
			let mut cells = self.cells.borrow_mut();
			let Some(cell) = cells.get_mut(name) else {
				cells.insert(name.into(), VisibilityCell::Owned(value));
				return true;
			};
			match cell {
				VisibilityCell::Owned(current) => {
					if *current == value {
						return false;
					}
					*current = value;
					return true;
				}
				VisibilityCell::Bound(binding) => {
					if binding.source.get() == value {
						return false;
					}
					binding.last_seen = value;
					binding.source.clone()
				}
			}
		};
		source.set(value);
		true
	}

	/// Checks a bound cell after a source notification.
	///
	/// Returns the new value when it differs from the last value a cascade ran
	/// for; repeated notifications for one change yield `None`.
	pub fn observe(&self, name: &str) -> Option<bool> {
		let source = match self.cells.borrow().get(name) {
			Some(VisibilityCell::Bound(binding)) => binding.source.clone(),
			_ => return None,
		};
		let value = source.get();

		let mut cells = self.cells.borrow_mut();
		let Some(VisibilityCell::Bound(binding)) = cells.get_mut(name) else {
			return None;
		};
		if binding.last_seen == value {
			return None;
		}
		binding.last_seen = value;
		Some(value)
	}

	/// Hands write ownership of `name` to `source`, returning the previous value.
	pub fn bind(&self, name: &str, source: Rc<dyn VisibilitySource>, subscription: Subscription) -> Option<bool> {
		let last_seen = source.get();
		let binding = VisibilityCell::Bound(Binding {
			source,
			last_seen,
			_subscription: subscription,
		});
		let previous = self.cells.borrow_mut().insert(name.into(), binding);
		previous.map(|cell| match cell {
			VisibilityCell::Owned(value) => value,
			VisibilityCell::Bound(binding) => binding.last_seen,
		})
	}

	/// Returns ownership of `name` to the store, keeping the source's current value.
	///
	/// Returns `false` when the cell was not bound.
	pub fn unbind(&self, name: &str) -> bool {
		let mut cells = self.cells.borrow_mut();
		let Some(VisibilityCell::Bound(binding)) = cells.get(name) else {
			return false;
		};
		let value = binding.source.get();
		// Dropping the binding drops its subscription.
		cells.insert(name.into(), VisibilityCell::Owned(value));
		true
	}

	pub fn is_bound(&self, name: &str) -> bool {
		matches!(self.cells.borrow().get(name), Some(VisibilityCell::Bound(_)))
	}
}
