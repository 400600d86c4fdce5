//! Identity-keyed memoization on top of MobX-style observables.
//!
//! [`Memoized`] wraps a function and keeps one lazily evaluated cell per
//! distinct argument tuple. Argument tuples are matched with [`Identity`]
//! (same value for primitives, same allocation for shared pointers), and a
//! cached result is recomputed only when an observable it read has changed.
//!
//! ```
//! use observe_memo::{Evaluation, Memoized, Var};
//!
//! let rate = Var::new(2u64);
//! let price = Memoized::new({
//! 	let rate = rate.clone();
//! 	move |cx: &Evaluation, amount: &u64| *amount * *rate.get(cx)
//! });
//!
//! assert_eq!(price.call(10), 20);
//! rate.set(3);
//! assert_eq!(price.call(10), 30);
//! ```

pub mod macros;

mod addr;
mod computed;
mod host;
mod identity;
mod memoize;
mod tracking;
mod var;
mod version;

use std::rc::{Rc, Weak};

pub use addr::{Addr, Pointer};
pub use computed::Computed;
pub use host::{Frozen, FrozenCell, Host, Reactive};
pub use identity::Identity;
pub use memoize::{memoize, Memoized, INLINE_ENTRIES};
pub use tracking::{Dependencies, Evaluation};
pub use var::Var;
pub use version::{Stamped, Version};

pub trait Derived: 'static {
	fn invalidate(self: Rc<Self>, invalid: Invalid);
}

pub trait Observable: 'static {
	/// Bring this observable up to date and
	/// return the version it ended up with.
	fn update(&self) -> Version;

	/// The version of the value currently held.
	fn version(&self) -> Version;

	/// `derived` read this observable and wants
	/// to hear about changes.
	fn used_by(&self, derived: Weak<dyn Derived>);

	/// `derived` no longer depends on this observable.
	fn not_used_by(&self, derived: &Weak<dyn Derived>);
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum State {
	Valid,
	Invalid(Invalid),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Invalid {
	/// Something upstream changed, dependencies
	/// have to be checked before recomputing.
	Maybe,
	Definitely,
}
