use std::cell::OnceCell;
use std::hash::Hash;
use std::rc::Rc;

use crate::{Computed, Evaluation};

/// Lazy cells supplied by a reactive runtime.
///
/// A cell wraps a thunk. The first read evaluates it; later reads return
/// the cached value unless the runtime decides something the thunk read
/// during its last run has changed, in which case it is evaluated again
/// before the read returns.
pub trait Host<T> {
	/// What a thunk receives to record the reads it depends on.
	type Context: 'static;

	/// Opaque handle to a cell. Clones refer to the same cell.
	type Cell: Clone;

	fn make_cell(&self, thunk: Box<dyn Fn(&Self::Context) -> T>) -> Self::Cell;

	/// Read without becoming a dependent of the cell.
	fn read(&self, cell: &Self::Cell) -> T;

	/// Read on behalf of the computation that owns `cx`.
	fn read_in(&self, cell: &Self::Cell, cx: &Self::Context) -> T;
}

/// Cells backed by [`Computed`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Reactive;

impl<T> Host<T> for Reactive
where
	T: Hash + Clone + 'static,
{
	type Context = Evaluation;
	type Cell = Computed<T>;

	fn make_cell(&self, thunk: Box<dyn Fn(&Evaluation) -> T>) -> Computed<T> {
		Computed::new(thunk)
	}

	fn read(&self, cell: &Computed<T>) -> T {
		cell.read()
	}

	fn read_in(&self, cell: &Computed<T>, cx: &Evaluation) -> T {
		T::clone(&cell.get(cx))
	}
}

/// Cells that are evaluated once and never go stale.
///
/// For functions that read no observable state.
#[derive(Debug, Default, Clone, Copy)]
pub struct Frozen;

pub struct FrozenCell<T> {
	thunk: Box<dyn Fn(&()) -> T>,
	value: OnceCell<T>,
}

impl<T> Host<T> for Frozen
where
	T: Clone + 'static,
{
	type Context = ();
	type Cell = Rc<FrozenCell<T>>;

	fn make_cell(&self, thunk: Box<dyn Fn(&()) -> T>) -> Rc<FrozenCell<T>> {
		Rc::new(FrozenCell {
			thunk,
			value: OnceCell::new(),
		})
	}

	fn read(&self, cell: &Rc<FrozenCell<T>>) -> T {
		// A panicking thunk leaves the cell empty.
		T::clone(cell.value.get_or_init(|| (cell.thunk)(&())))
	}

	fn read_in(&self, cell: &Rc<FrozenCell<T>>, _: &()) -> T {
		<Self as Host<T>>::read(self, cell)
	}
}
