use std::fmt::Debug;
use std::hash::Hash;
use std::ops::Deref;

/// Fingerprint of an observable value.
///
/// Two versions are equal when the values hash the same under fxhash.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Version(u64);

impl Version {
	/// Version of a cell that has never been evaluated.
	pub const UNSET: Version = Version(0);

	pub fn of<T: Hash + ?Sized>(value: &T) -> Self {
		Version(fxhash::hash64(value))
	}
}

/// A value together with its [`Version`].
pub struct Stamped<T> {
	value: T,
	version: Version,
}

impl<T: Hash> Stamped<T> {
	pub fn new(value: T) -> Self {
		let version = Version::of(&value);
		Stamped { value, version }
	}

	/// Mutate the value in place and restamp it.
	/// Returns `true` when the version changed.
	pub fn update(&mut self, func: impl FnOnce(&mut T)) -> bool {
		func(&mut self.value);
		let version = Version::of(&self.value);
		let changed = version != self.version;
		self.version = version;
		changed
	}
}

impl<T> Stamped<T> {
	pub fn version(&self) -> Version {
		self.version
	}

	pub fn into_inner(self) -> T {
		self.value
	}
}

impl<T> Deref for Stamped<T> {
	type Target = T;
	fn deref(&self) -> &Self::Target {
		&self.value
	}
}

impl<T> Debug for Stamped<T>
where
	T: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.value.fmt(f)
	}
}
