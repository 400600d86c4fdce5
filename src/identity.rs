use std::hash::Hash;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::addr::Pointer;
use crate::{Computed, Var};

/// Identity comparison used to match argument tuples.
///
/// Values without an identity of their own (numbers, strings, `()`)
/// are identical when they are equal. Shared pointers and reactive
/// handles are identical only when they point at the same allocation,
/// whatever their contents. Nothing is ever compared structurally
/// through a pointer.
pub trait Identity {
	fn same(&self, other: &Self) -> bool;
}

macro_rules! by_value {
	($($ty:ty),* $(,)?) => {
		$(
			impl Identity for $ty {
				#[inline]
				fn same(&self, other: &Self) -> bool {
					self == other
				}
			}
		)*
	};
}

by_value!(
	(),
	bool,
	char,
	u8,
	u16,
	u32,
	u64,
	u128,
	usize,
	i8,
	i16,
	i32,
	i64,
	i128,
	isize,
	str,
	String,
);

// `NaN` is identical to itself, `0.0` and `-0.0` are not identical.
macro_rules! by_bits {
	($($ty:ty),*) => {
		$(
			impl Identity for $ty {
				#[inline]
				fn same(&self, other: &Self) -> bool {
					(self.is_nan() && other.is_nan()) || self.to_bits() == other.to_bits()
				}
			}
		)*
	};
}

by_bits!(f32, f64);

impl<T: ?Sized> Identity for Rc<T> {
	#[inline]
	fn same(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}

impl<T: ?Sized> Identity for Weak<T> {
	#[inline]
	fn same(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}

impl<T: ?Sized> Identity for Arc<T> {
	#[inline]
	fn same(&self, other: &Self) -> bool {
		self.addr() == other.addr()
	}
}

impl<T: 'static> Identity for Var<T> {
	#[inline]
	fn same(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl<T: Hash + 'static> Identity for Computed<T> {
	#[inline]
	fn same(&self, other: &Self) -> bool {
		self.ptr_eq(other)
	}
}

impl<T: Identity + ?Sized> Identity for &T {
	#[inline]
	fn same(&self, other: &Self) -> bool {
		T::same(*self, *other)
	}
}

impl<T: Identity> Identity for Option<T> {
	fn same(&self, other: &Self) -> bool {
		match (self, other) {
			(Some(a), Some(b)) => a.same(b),
			(None, None) => true,
			_ => false,
		}
	}
}

impl<T: Identity> Identity for [T] {
	fn same(&self, other: &Self) -> bool {
		self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a.same(b))
	}
}

impl<T: Identity, const N: usize> Identity for [T; N] {
	fn same(&self, other: &Self) -> bool {
		self[..].same(&other[..])
	}
}

impl<T: Identity> Identity for Vec<T> {
	fn same(&self, other: &Self) -> bool {
		self[..].same(&other[..])
	}
}

macro_rules! tuple {
	($($name:ident $idx:tt),+) => {
		impl<$($name: Identity),+> Identity for ($($name,)+) {
			#[inline]
			fn same(&self, other: &Self) -> bool {
				$(self.$idx.same(&other.$idx))&&+
			}
		}
	};
}

tuple!(A 0);
tuple!(A 0, B 1);
tuple!(A 0, B 1, C 2);
tuple!(A 0, B 1, C 2, D 3);
tuple!(A 0, B 1, C 2, D 3, E 4);
tuple!(A 0, B 1, C 2, D 3, E 4, F 5);
tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
