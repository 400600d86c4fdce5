use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::{Rc, Weak};
use std::sync::Arc;

/// Pointers that can be keyed by the address they point at.
pub trait Pointer {
	fn addr(&self) -> *const ();
}

impl<T: ?Sized> Pointer for Rc<T> {
	fn addr(&self) -> *const () {
		Rc::as_ptr(self) as *const ()
	}
}

impl<T: ?Sized> Pointer for Arc<T> {
	fn addr(&self) -> *const () {
		Arc::as_ptr(self) as *const ()
	}
}

impl<T: ?Sized> Pointer for Weak<T> {
	fn addr(&self) -> *const () {
		Weak::as_ptr(self) as *const ()
	}
}

/// Compares and hashes a pointer by its address only.
///
/// The vtable half of a fat pointer is ignored, so the same allocation
/// seen through two different trait objects is still the same key.
pub struct Addr<P> {
	ptr: P,
}

impl<P: Pointer> Addr<P> {
	pub fn new(ptr: P) -> Self {
		Addr { ptr }
	}
}

impl<P> Deref for Addr<P> {
	type Target = P;
	fn deref(&self) -> &Self::Target {
		&self.ptr
	}
}

impl<P: Pointer> PartialEq for Addr<P> {
	fn eq(&self, other: &Self) -> bool {
		self.ptr.addr() == other.ptr.addr()
	}
}

impl<P: Pointer> Eq for Addr<P> {}

impl<P: Pointer> Hash for Addr<P> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.ptr.addr().hash(state)
	}
}
