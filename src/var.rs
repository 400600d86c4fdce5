use std::cell::{Ref, RefCell};
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use fxhash::FxHashSet;

use crate::addr::Addr;
use crate::tracking::Evaluation;
use crate::{Computed, Derived, Invalid, Observable, Stamped, Version};

/// Observable variable.
///
/// Reads through an [`Evaluation`] subscribe the evaluated computation;
/// writes that change the value's version invalidate every subscriber.
pub struct Var<T> {
	body: Rc<VarBody<T>>,
}

pub(crate) struct VarBody<T> {
	value: RefCell<Stamped<T>>,
	used_by: RefCell<FxHashSet<Addr<Weak<dyn Derived>>>>,
	this: Weak<VarBody<T>>,
}

impl<T> Clone for Var<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> Default for Var<T>
where
	T: Default + Hash + 'static,
{
	fn default() -> Self {
		Var::new(Default::default())
	}
}

impl<T> Var<T>
where
	T: 'static,
{
	pub fn new(value: T) -> Self
	where
		T: Hash,
	{
		Var {
			body: Rc::new_cyclic(|this| VarBody {
				value: RefCell::new(Stamped::new(value)),
				used_by: RefCell::new(FxHashSet::default()),
				this: this.clone(),
			}),
		}
	}

	pub fn map<F, R>(&self, func: F) -> Computed<R>
	where
		F: Fn(&T) -> R + 'static,
		R: Hash + 'static,
	{
		let this = self.clone();
		Computed::new(Box::new(move |cx: &Evaluation| func(&*this.get(cx))))
	}

	#[inline]
	pub fn get(&self, eval: &impl AsRef<Evaluation>) -> Ref<'_, T> {
		self.body.get(eval.as_ref())
	}

	#[inline]
	pub fn get_once(&self) -> Ref<'_, T> {
		Ref::map(self.body.value.borrow(), |v| &**v)
	}

	#[inline]
	pub fn set(&self, value: T)
	where
		T: Hash,
	{
		let _ = self.replace(value);
	}

	pub fn replace(&self, value: T) -> T
	where
		T: Hash,
	{
		let next = Stamped::new(value);
		let prev = std::mem::replace(&mut *self.body.value.borrow_mut(), next);
		if prev.version() != self.body.version() {
			self.body.invalidate();
		}
		prev.into_inner()
	}

	pub fn update(&self, func: impl FnOnce(&mut T))
	where
		T: Hash,
	{
		let changed = self.body.value.borrow_mut().update(func);
		if changed {
			self.body.invalidate();
		}
	}

	/// Whether `self` and `other` are handles to the same variable.
	pub fn ptr_eq(&self, other: &Var<T>) -> bool {
		Rc::ptr_eq(&self.body, &other.body)
	}
}

impl<T: 'static> VarBody<T> {
	fn get<'a>(&'a self, eval: &Evaluation) -> Ref<'a, T> {
		let value = self.value.borrow();
		if let Some(this) = self.this.upgrade() {
			eval.based_on(this, value.version());
		}
		self.used_by
			.borrow_mut()
			.insert(Addr::new(eval.parent()));

		Ref::map(value, |v| &**v)
	}

	fn invalidate(&self) {
		let subscribers: Vec<_> = self
			.used_by
			.borrow()
			.iter()
			.filter_map(|derived| derived.upgrade())
			.collect();

		tracing::trace!(subscribers = subscribers.len(), "var changed");
		for derived in subscribers {
			derived.invalidate(Invalid::Definitely)
		}
	}
}

impl<T: 'static> Observable for VarBody<T> {
	fn version(&self) -> Version {
		self.value.borrow().version()
	}

	fn update(&self) -> Version {
		self.version()
	}

	fn used_by(&self, derived: Weak<dyn Derived>) {
		self.used_by.borrow_mut().insert(Addr::new(derived));
	}

	fn not_used_by(&self, derived: &Weak<dyn Derived>) {
		self.used_by
			.borrow_mut()
			.remove(&Addr::new(derived.clone()));
	}
}

impl<T> Hash for Var<T> {
	fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
		self.body.value.borrow().version().hash(state)
	}
}

impl<T> Debug for Var<T>
where
	T: 'static + Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.get_once().fmt(f)
	}
}
