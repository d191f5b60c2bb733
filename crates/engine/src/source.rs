//! Externally driven visibility sources.
//!
//! A bound app reads its visibility from a [`VisibilitySource`] instead of an
//! engine-owned cell. Sources notify listeners when they change; the engine
//! turns each logical change into exactly one rule evaluation.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use slab::Slab;
use smallvec::SmallVec;

/// A boolean the host can drive from outside the engine.
pub trait VisibilitySource {
	fn get(&self) -> bool;

	/// Writes a new value. Implementations should notify listeners on change.
	fn set(&self, value: bool);

	/// Registers `listener`; it stays registered until the returned handle drops.
	fn subscribe(&self, listener: Rc<dyn Fn()>) -> Subscription;
}

/// RAII handle for a listener registration.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
	cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
	pub fn new(cancel: impl FnOnce() + 'static) -> Self {
		Self {
			cancel: Some(Box::new(cancel)),
		}
	}

	/// A handle with nothing to clean up.
	pub fn empty() -> Self {
		Self { cancel: None }
	}

	/// Unsubscribes now.
	pub fn cancel(mut self) {
		if let Some(cancel) = self.cancel.take() {
			cancel();
		}
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(cancel) = self.cancel.take() {
			cancel();
		}
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("active", &self.cancel.is_some())
			.finish()
	}
}

struct SourceInner {
	value: Cell<bool>,
	listeners: RefCell<Slab<Rc<dyn Fn()>>>,
}

/// Shared, single-threaded [`VisibilitySource`].
///
/// Clones share the same value and listener list.
#[derive(Clone)]
pub struct SharedSource {
	inner: Rc<SourceInner>,
}

impl SharedSource {
	pub fn new(value: bool) -> Self {
		Self {
			inner: Rc::new(SourceInner {
				value: Cell::new(value),
				listeners: RefCell::new(Slab::new()),
			}),
		}
	}

	/// Notifies every listener without changing the value.
	pub fn notify(&self) {
		// Listeners may subscribe or unsubscribe while being notified.
		let listeners: SmallVec<[Rc<dyn Fn()>; 4]> =
			self.inner.listeners.borrow().iter().map(|(_, listener)| listener.clone()).collect();
		for listener in listeners {
			listener();
		}
	}

	pub fn listener_count(&self) -> usize {
		self.inner.listeners.borrow().len()
	}
}

impl VisibilitySource for SharedSource {
	fn get(&self) -> bool {
		self.inner.value.get()
	}

	fn set(&self, value: bool) {
		if self.inner.value.replace(value) != value {
			self.notify();
		}
	}

	fn subscribe(&self, listener: Rc<dyn Fn()>) -> Subscription {
		let key = self.inner.listeners.borrow_mut().insert(listener);
		let inner: Weak<SourceInner> = Rc::downgrade(&self.inner);
		Subscription::new(move || {
			if let Some(inner) = inner.upgrade() {
				inner.listeners.borrow_mut().try_remove(key);
			}
		})
	}
}

impl fmt::Debug for SharedSource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SharedSource")
			.field("value", &self.inner.value.get())
			.field("listeners", &self.listener_count())
			.finish()
	}
}
