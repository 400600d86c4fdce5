use std::cell::RefCell;
use std::rc::{Rc, Weak};

use fxhash::FxHashMap;

use crate::addr::Addr;
use crate::{Derived, Observable, Version};

/// Observables a derived value was computed from, with the
/// versions they had at that moment.
#[derive(Default)]
pub struct Dependencies {
	based_on: FxHashMap<Addr<Rc<dyn Observable>>, Version>,
}

impl Dependencies {
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn len(&self) -> usize {
		self.based_on.len()
	}

	pub fn based_on(&mut self, observable: Rc<dyn Observable>, version: Version) {
		self.based_on.insert(Addr::new(observable), version);
	}

	/// Bring every dependency up to date and check that
	/// none of them ended up with a different version.
	pub fn are_valid(&self) -> bool {
		self.based_on
			.iter()
			.all(|(base, version)| base.update() == *version)
	}

	/// Replace the recorded set with `next`, unsubscribing `parent`
	/// from everything it no longer reads.
	pub fn swap(&mut self, next: Dependencies, parent: &Weak<dyn Derived>) {
		let prev = std::mem::replace(&mut self.based_on, next.based_on);
		prev.keys()
			.filter(|k| !self.based_on.contains_key(*k))
			.for_each(|k| k.not_used_by(parent));
	}

	/// Unsubscribe `parent` from everything.
	pub fn release(&mut self, parent: &Weak<dyn Derived>) {
		for (base, _) in self.based_on.drain() {
			base.not_used_by(parent)
		}
	}
}

/// Tracking context handed to a derived computation.
///
/// Every observable read through it is recorded as a dependency of
/// `parent`, which is the computation being evaluated.
pub struct Evaluation {
	dependencies: RefCell<Dependencies>,
	parent: Weak<dyn Derived>,
}

impl AsRef<Evaluation> for Evaluation {
	fn as_ref(&self) -> &Evaluation {
		self
	}
}

impl Evaluation {
	pub fn new(parent: Weak<dyn Derived>) -> Self {
		Evaluation {
			dependencies: RefCell::new(Dependencies::new()),
			parent,
		}
	}

	pub(crate) fn parent(&self) -> Weak<dyn Derived> {
		self.parent.clone()
	}

	pub(crate) fn based_on(&self, observable: Rc<dyn Observable>, version: Version) {
		self.dependencies
			.borrow_mut()
			.based_on(observable, version);
	}

	pub fn take(self) -> Dependencies {
		self.dependencies.into_inner()
	}
}
