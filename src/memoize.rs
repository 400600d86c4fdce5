use std::cell::RefCell;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::{Evaluation, Host, Identity, Reactive};

/// Entries kept inline before the cache spills to the heap.
pub const INLINE_ENTRIES: usize = 4;

struct Entry<A, C> {
	args: Rc<A>,
	cell: C,
}

/// A function with one lazily evaluated cell per argument tuple.
///
/// Argument tuples are matched with [`Identity`], by a linear scan in
/// insertion order. A tuple gets its cell on the first call with it and
/// keeps it for as long as the `Memoized` lives; nothing is ever evicted.
/// Whether a cached result is still current is decided by the host.
///
/// ```
/// use std::rc::Rc;
/// use observe_memo::Memoized;
///
/// let len = Memoized::new(|_, (s,): &(Rc<str>,)| s.len());
///
/// let hello: Rc<str> = Rc::from("hello");
/// assert_eq!(len.call((hello.clone(),)), 5);
/// assert_eq!(len.call((hello,)), 5);
/// assert_eq!(len.len(), 1);
///
/// // Same contents, different allocation.
/// assert_eq!(len.call((Rc::from("hello"),)), 5);
/// assert_eq!(len.len(), 2);
/// ```
pub struct Memoized<A, R, H = Reactive>
where
	H: Host<R>,
{
	host: H,
	func: Rc<dyn Fn(&H::Context, &A) -> R>,
	cache: RefCell<SmallVec<[Entry<A, H::Cell>; INLINE_ENTRIES]>>,
}

impl<A, R> Memoized<A, R, Reactive>
where
	A: Identity + 'static,
	R: Hash + Clone + 'static,
{
	pub fn new<F>(func: F) -> Self
	where
		F: Fn(&Evaluation, &A) -> R + 'static,
	{
		Self::with_host(Reactive, func)
	}
}

impl<A, R, H> Memoized<A, R, H>
where
	A: Identity + 'static,
	R: 'static,
	H: Host<R>,
{
	pub fn with_host<F>(host: H, func: F) -> Self
	where
		F: Fn(&H::Context, &A) -> R + 'static,
	{
		Memoized {
			host,
			func: Rc::new(func),
			cache: RefCell::new(SmallVec::new()),
		}
	}

	/// Call the function, reusing the cell of an identical earlier call.
	pub fn call(&self, args: A) -> R {
		let cell = self.cell(args);
		self.host.read(&cell)
	}

	/// Like [`call`](Self::call), but the computation owning `cx`
	/// becomes a dependent of the result.
	pub fn get(&self, cx: &H::Context, args: A) -> R {
		let cell = self.cell(args);
		self.host.read_in(&cell, cx)
	}

	/// Whether a call identical to `args` has been made before.
	pub fn contains(&self, args: &A) -> bool {
		self.lookup(args).is_some()
	}

	/// Number of distinct argument tuples seen so far.
	pub fn len(&self) -> usize {
		self.cache.borrow().len()
	}

	pub fn is_empty(&self) -> bool {
		self.cache.borrow().is_empty()
	}

	fn lookup(&self, args: &A) -> Option<H::Cell> {
		self.cache
			.borrow()
			.iter()
			.find(|entry| A::same(&*entry.args, args))
			.map(|entry| entry.cell.clone())
	}

	// The cache is never borrowed while a cell is read: the function may
	// call back into this `Memoized`, and it may panic.
	fn cell(&self, args: A) -> H::Cell {
		if let Some(cell) = self.lookup(&args) {
			tracing::trace!("memoized call hit");
			return cell;
		}

		let args = Rc::new(args);
		let thunk = {
			let func = self.func.clone();
			let args = args.clone();
			Box::new(move |cx: &H::Context| func(cx, &*args))
		};

		let cell = self.host.make_cell(thunk);
		let mut cache = self.cache.borrow_mut();
		cache.push(Entry {
			args,
			cell: cell.clone(),
		});
		tracing::trace!(entries = cache.len(), "memoized call missed");

		cell
	}
}

impl<A, R, H> Debug for Memoized<A, R, H>
where
	H: Host<R> + Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Memoized")
			.field("host", &self.host)
			.field("entries", &self.cache.borrow().len())
			.finish()
	}
}

/// Memoize `func` behind a plain closure with the same argument shape.
///
/// The closure reads untracked; use [`Memoized::get`] to call a memoized
/// function from inside another computation.
pub fn memoize<A, R, F>(func: F) -> impl Fn(A) -> R
where
	A: Identity + 'static,
	R: Hash + Clone + 'static,
	F: Fn(&Evaluation, &A) -> R + 'static,
{
	let memoized = Memoized::new(func);
	move |args| memoized.call(args)
}
