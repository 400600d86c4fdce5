use std::cell::{Cell, OnceCell};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use mockall::predicate;
use observe_memo::{computed, memoize, Evaluation, Frozen, Memoized, Var};


use mock::Spy;

struct Point {
	x: i64,
}

fn trace() {
	let _ = tracing_subscriber::fmt()
		.with_max_level(tracing_subscriber::filter::LevelFilter::TRACE)
		.with_test_writer()
		.try_init();
}

#[test]
fn same_references_hit() {
	trace();
	let mock = mock::SharedMock::new();
	let sum = Memoized::new({
		let mock = mock.clone();
		move |_: &Evaluation, (a, b): &(Rc<i64>, Rc<i64>)| {
			mock.get().evaluated(**a + **b);
			**a + **b
		}
	});

	let a = Rc::new(1);
	let b = Rc::new(2);

	mock.get()
		.expect_evaluated()
		.with(predicate::eq(3))
		.times(1)
		.return_const(());
	assert_eq!(sum.call((a.clone(), b.clone())), 3);
	assert_eq!(sum.call((a.clone(), b.clone())), 3);
	mock.get().checkpoint();

	assert_eq!(sum.len(), 1);
	assert!(sum.contains(&(a, b)));
}

#[test]
fn distinct_values_miss() {
	let mock = mock::SharedMock::new();
	let sum = Memoized::new({
		let mock = mock.clone();
		move |_: &Evaluation, (a, b): &(i64, i64)| {
			mock.get().evaluated(a + b);
			a + b
		}
	});

	mock.get().expect_evaluated().times(2).return_const(());
	assert_eq!(sum.call((1, 2)), 3);
	assert_eq!(sum.call((1, 3)), 4);
	assert_eq!(sum.call((1, 2)), 3);
	mock.get().checkpoint();

	assert_eq!(sum.len(), 2);
}

#[test]
fn equal_but_distinct_objects_miss() {
	let mock = mock::SharedMock::new();
	let read_x = Memoized::new({
		let mock = mock.clone();
		move |_: &Evaluation, point: &Rc<Point>| {
			mock.get().evaluated(point.x);
			point.x
		}
	});

	let first = Rc::new(Point { x: 1 });
	let second = Rc::new(Point { x: 1 });

	mock.get().expect_evaluated().times(2).return_const(());
	assert_eq!(read_x.call(first.clone()), 1);
	assert_eq!(read_x.call(second.clone()), 1);
	assert_eq!(read_x.call(first), 1);
	mock.get().checkpoint();

	assert_eq!(read_x.len(), 2);
}

#[test]
fn arity_mismatch_never_matches() {
	let mock = mock::SharedMock::new();
	let total = Memoized::new({
		let mock = mock.clone();
		move |_: &Evaluation, args: &Vec<i64>| {
			let total = args.iter().sum::<i64>();
			mock.get().evaluated(total);
			total
		}
	});

	mock.get().expect_evaluated().times(3).return_const(());
	assert_eq!(total.call(vec![1]), 1);
	assert_eq!(total.call(vec![1, 2]), 3);
	assert_eq!(total.call(vec![1, 0]), 1);
	assert_eq!(total.call(vec![1]), 1);
	mock.get().checkpoint();

	assert_eq!(total.len(), 3);
	assert!(!total.contains(&vec![]));
}

#[test]
fn stale_dependency_recomputes() {
	trace();
	let factor = Var::new(2);
	let mock = mock::SharedMock::new();
	let scale = Memoized::new({
		let factor = factor.clone();
		let mock = mock.clone();
		move |cx: &Evaluation, x: &i64| {
			mock.get().evaluated(*x);
			if *x < 0 {
				*x
			} else {
				*x * *factor.get(cx)
			}
		}
	});

	mock.get().expect_evaluated().times(2).return_const(());
	assert_eq!(scale.call(10), 20);
	assert_eq!(scale.call(-10), -10);
	mock.get().checkpoint();

	// Only the tuple that read `factor` runs again.
	mock.get()
		.expect_evaluated()
		.with(predicate::eq(10))
		.times(1)
		.return_const(());
	factor.set(3);
	assert_eq!(scale.call(10), 30);
	assert_eq!(scale.call(-10), -10);
	mock.get().checkpoint();

	mock.get().expect_evaluated().never();
	factor.set(3);
	assert_eq!(scale.call(10), 30);
	mock.get().checkpoint();

	assert_eq!(scale.len(), 2);
}

#[test]
fn entries_are_never_evicted() {
	let mock = mock::SharedMock::new();
	let double = Memoized::new({
		let mock = mock.clone();
		move |_: &Evaluation, x: &i64| {
			mock.get().evaluated(*x);
			x * 2
		}
	});

	mock.get().expect_evaluated().times(100).return_const(());
	for x in 0..100 {
		assert_eq!(double.call(x), x * 2);
	}
	mock.get().checkpoint();

	assert_eq!(double.len(), 100);

	mock.get().expect_evaluated().never();
	assert_eq!(double.call(0), 0);
	assert_eq!(double.call(99), 198);
	mock.get().checkpoint();
}

#[test]
fn panics_reach_the_caller_and_retry() {
	let mock = mock::SharedMock::new();
	let invert = Memoized::new({
		let mock = mock.clone();
		move |_: &Evaluation, x: &i64| {
			mock.get().evaluated(*x);
			if *x == 0 {
				panic!("division by zero");
			}
			100 / x
		}
	});

	mock.get().expect_evaluated().times(3).return_const(());
	assert_eq!(invert.call(4), 25);
	assert!(catch_unwind(AssertUnwindSafe(|| invert.call(0))).is_err());
	assert!(catch_unwind(AssertUnwindSafe(|| invert.call(0))).is_err());
	assert_eq!(invert.call(4), 25);
	mock.get().checkpoint();

	assert!(invert.contains(&0));
	assert_eq!(invert.len(), 2);
}

#[test]
fn writes_during_evaluation_are_not_lost() {
	trace();
	let source = Var::new(1);
	let mock = mock::SharedMock::new();
	let read_then_bump = Memoized::new({
		let source = source.clone();
		let mock = mock.clone();
		move |cx: &Evaluation, _: &()| {
			let value = *source.get(cx);
			mock.get().evaluated(value);
			source.set(2);
			value
		}
	});

	mock.get().expect_evaluated().times(2).return_const(());
	assert_eq!(read_then_bump.call(()), 1);
	assert_eq!(read_then_bump.call(()), 2);
	assert_eq!(read_then_bump.call(()), 2);
	mock.get().checkpoint();
}

#[test]
fn errors_are_returned_verbatim() {
	let mock = mock::SharedMock::new();
	let root = Memoized::new({
		let mock = mock.clone();
		move |_: &Evaluation, x: &i64| -> Result<i64, String> {
			mock.get().evaluated(*x);
			if *x < 0 {
				return Err(format!("{} is negative", x));
			}
			Ok((*x as f64).sqrt() as i64)
		}
	});

	mock.get().expect_evaluated().times(2).return_const(());
	assert_eq!(root.call(-4), Err(String::from("-4 is negative")));
	assert_eq!(root.call(16), Ok(4));
	assert_eq!(root.call(-4), Err(String::from("-4 is negative")));
	mock.get().checkpoint();
}

#[test]
fn tracked_reads_propagate_to_the_caller() {
	trace();
	let base = Var::new(1);
	let scaled = Rc::new(memoize!((base) cx, x: i64 => *x * *base.get(cx)));

	let mock = mock::SharedMock::new();
	let total = computed!((scaled, mock) cx => {
		let total = scaled.get(cx, 2) + scaled.get(cx, 3);
		mock.get().evaluated(total);
		total
	});

	mock.get().expect_evaluated().times(2).return_const(());
	assert_eq!(total.read(), 5);
	base.set(2);
	assert!(!total.is_valid());
	assert_eq!(total.read(), 10);
	mock.get().checkpoint();

	assert_eq!(scaled.len(), 2);
}

#[test]
fn recursive_calls_share_the_cache() {
	let fib: Rc<OnceCell<Memoized<u64, u64>>> = Rc::new(OnceCell::new());
	let memoized = Memoized::new({
		let fib = fib.clone();
		move |cx: &Evaluation, n: &u64| {
			if *n < 2 {
				return *n;
			}
			let fib = fib.get().expect("initialized");
			fib.get(cx, n - 1) + fib.get(cx, n - 2)
		}
	});
	let _ = fib.set(memoized);

	let fib = fib.get().expect("initialized");
	assert_eq!(fib.call(50), 12_586_269_025);
	assert_eq!(fib.len(), 51);
}

#[test]
#[should_panic(expected = "during its own evaluation")]
fn reading_itself_panics() {
	let cycle: Rc<OnceCell<Memoized<u64, u64>>> = Rc::new(OnceCell::new());
	let memoized = Memoized::new({
		let cycle = cycle.clone();
		move |cx: &Evaluation, n: &u64| cycle.get().expect("initialized").get(cx, *n)
	});
	let _ = cycle.set(memoized);

	cycle.get().expect("initialized").call(1);
}

#[test]
fn frozen_host_never_recomputes() {
	let source = Var::new(1);
	let mock = mock::SharedMock::new();
	let snapshot = Memoized::with_host(Frozen, {
		let source = source.clone();
		let mock = mock.clone();
		move |_: &(), x: &i64| {
			mock.get().evaluated(*x);
			*x + *source.get_once()
		}
	});

	mock.get().expect_evaluated().times(1).return_const(());
	assert_eq!(snapshot.call(1), 2);
	source.set(10);
	assert_eq!(snapshot.call(1), 2);
	mock.get().checkpoint();
}

#[test]
fn frozen_host_retries_after_a_panic() {
	let failed = Rc::new(Cell::new(false));
	let mock = mock::SharedMock::new();
	let flaky = Memoized::with_host(Frozen, {
		let failed = failed.clone();
		let mock = mock.clone();
		move |_: &(), x: &i64| {
			mock.get().evaluated(*x);
			if !failed.replace(true) {
				panic!("first attempt fails");
			}
			*x * 10
		}
	});

	mock.get().expect_evaluated().times(2).return_const(());
	assert!(catch_unwind(AssertUnwindSafe(|| flaky.call(1))).is_err());
	assert_eq!(flaky.call(1), 10);
	assert_eq!(flaky.call(1), 10);
	mock.get().checkpoint();

	assert_eq!(flaky.len(), 1);
}

#[test]
fn memoize_returns_a_plain_function() {
	let mock = mock::SharedMock::new();
	let square = memoize({
		let mock = mock.clone();
		move |_: &Evaluation, x: &i64| {
			mock.get().evaluated(*x);
			x * x
		}
	});

	mock.get().expect_evaluated().times(2).return_const(());
	assert_eq!(square(4), 16);
	assert_eq!(square(4), 16);
	assert_eq!(square(5), 25);
	mock.get().checkpoint();
}
