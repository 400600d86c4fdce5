use std::cell::{Cell, Ref, RefCell};
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use fxhash::FxHashSet;

use crate::addr::Addr;
use crate::tracking::{Dependencies, Evaluation};
use crate::{Derived, Invalid, Observable, Stamped, State, Version};

/// Lazily evaluated derived value.
///
/// The function runs on the first read. Afterwards the cached value is
/// returned until one of the observables read during the last run
/// changes, and even then only the next read pays for the recomputation.
pub struct Computed<T>
where
	T: Hash + 'static,
{
	body: Rc<ComputedBody<T>>,
}

impl<T> Clone for Computed<T>
where
	T: Hash,
{
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

pub(crate) struct ComputedBody<T>
where
	T: Hash + 'static,
{
	value: RefCell<Option<Stamped<T>>>,
	inner: RefCell<ComputedInner<T>>,
	/// Invalidation that arrived while the function was running.
	pending: Cell<Option<Invalid>>,
}

struct ComputedInner<T>
where
	T: Hash + 'static,
{
	func: Box<dyn Fn(&Evaluation) -> T>,
	state: State,
	used_by: FxHashSet<Addr<Weak<dyn Derived>>>,
	dependencies: Dependencies,
	this: Weak<ComputedBody<T>>,
}

impl<T> Drop for ComputedInner<T>
where
	T: Hash + 'static,
{
	fn drop(&mut self) {
		let this = self.this.clone() as Weak<dyn Derived>;
		self.dependencies.release(&this);
	}
}

impl<T> Computed<T>
where
	T: Hash + 'static,
{
	pub fn new(func: Box<dyn Fn(&Evaluation) -> T>) -> Self {
		Computed {
			body: Rc::new_cyclic(|this| ComputedBody {
				value: RefCell::new(None),
				pending: Cell::new(None),
				inner: RefCell::new(ComputedInner {
					func,
					state: State::Invalid(Invalid::Definitely),
					used_by: FxHashSet::default(),
					dependencies: Dependencies::new(),
					this: this.clone(),
				}),
			}),
		}
	}

	/// Read without subscribing anybody.
	#[inline]
	pub fn get_once(&self) -> Ref<'_, T> {
		self.body.refresh();
		self.body.value()
	}

	/// Read on behalf of the computation evaluated by `cx`.
	#[inline]
	pub fn get<'a>(&'a self, cx: &'a impl AsRef<Evaluation>) -> Ref<'a, T> {
		self.body.get(cx.as_ref())
	}

	/// Untracked read that clones the value out.
	pub fn read(&self) -> T
	where
		T: Clone,
	{
		T::clone(&self.get_once())
	}

	/// `true` when the cached value is known to be current
	/// without checking any dependency.
	pub fn is_valid(&self) -> bool {
		self.body.inner.borrow().state == State::Valid
	}

	/// Whether `self` and `other` are handles to the same cell.
	pub fn ptr_eq(&self, other: &Computed<T>) -> bool {
		Rc::ptr_eq(&self.body, &other.body)
	}
}

impl<T> ComputedBody<T>
where
	T: Hash + 'static,
{
	fn value(&self) -> Ref<'_, T> {
		Ref::map(self.value.borrow(), |value| {
			&**value
				.as_ref()
				.expect("computed value is set by a successful refresh")
		})
	}

	fn get<'a>(&'a self, eval: &Evaluation) -> Ref<'a, T> {
		self.refresh();
		let mut inner = self.inner.borrow_mut();
		if let Some(this) = inner.this.upgrade() {
			eval.based_on(this, self.version());
		}
		inner.used_by.insert(Addr::new(eval.parent()));
		drop(inner);

		self.value()
	}

	/// Recompute the value if it might be stale.
	///
	/// A panic in the function leaves the cell invalid,
	/// so the next read runs it again.
	fn refresh(&self) {
		let Ok(mut inner) = self.inner.try_borrow_mut() else {
			panic!("computed value was read during its own evaluation");
		};

		if inner.state == State::Valid {
			return;
		}

		self.pending.set(None);
		let body = inner.this.clone();

		let is_valid = match inner.state {
			State::Invalid(Invalid::Maybe) => inner.dependencies.are_valid(),
			_ => false,
		};

		if is_valid {
			tracing::debug!("computed dependencies unchanged, keeping cached value");
			inner.state = State::Valid;
		} else {
			tracing::trace!(dependencies = inner.dependencies.len(), "evaluating computed");

			let this = body.clone() as Weak<dyn Derived>;
			let evaluation = Evaluation::new(this.clone());
			let value = (inner.func)(&evaluation);

			inner.dependencies.swap(evaluation.take(), &this);
			inner.state = State::Valid;
			*self.value.borrow_mut() = Some(Stamped::new(value));
		}
		drop(inner);

		// Something read during the refresh changed after it was read.
		if let Some(invalid) = self.pending.take() {
			if let Some(body) = body.upgrade() {
				body.invalidate(invalid);
			}
		}
	}
}

impl<T> Observable for ComputedBody<T>
where
	T: Hash + 'static,
{
	fn update(&self) -> Version {
		self.refresh();
		self.version()
	}

	fn version(&self) -> Version {
		self.value
			.borrow()
			.as_ref()
			.map_or(Version::UNSET, Stamped::version)
	}

	fn used_by(&self, derived: Weak<dyn Derived>) {
		self.inner.borrow_mut().used_by.insert(Addr::new(derived));
	}

	fn not_used_by(&self, derived: &Weak<dyn Derived>) {
		// Dependents are released when they drop, which may happen
		// in the middle of our own evaluation.
		if let Ok(mut inner) = self.inner.try_borrow_mut() {
			inner.used_by.remove(&Addr::new(derived.clone()));
		}
	}
}

impl<T> Derived for ComputedBody<T>
where
	T: Hash + 'static,
{
	fn invalidate(self: Rc<Self>, invalid: Invalid) {
		let Ok(mut inner) = self.inner.try_borrow_mut() else {
			tracing::trace!(?invalid, "computed invalidated during its own evaluation");
			let invalid = match self.pending.get() {
				Some(Invalid::Definitely) => Invalid::Definitely,
				_ => invalid,
			};
			self.pending.set(Some(invalid));
			return;
		};

		if inner.state != State::Valid {
			return;
		}

		tracing::trace!(?invalid, "invalidating computed");
		inner.state = State::Invalid(invalid);
		let dependents: Vec<_> = inner
			.used_by
			.iter()
			.filter_map(|derived| derived.upgrade())
			.collect();
		drop(inner);

		for derived in dependents {
			derived.invalidate(Invalid::Maybe);
		}
	}
}

impl<T> Hash for Computed<T>
where
	T: Hash + 'static,
{
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.body.update().hash(state)
	}
}

impl<T> Debug for Computed<T>
where
	T: Hash + Debug + 'static,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Computed")
			.field("valid", &self.is_valid())
			.field("value", &self.body.value.borrow().as_ref())
			.finish()
	}
}
