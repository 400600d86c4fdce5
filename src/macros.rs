pub use enclose::*;

/// Build a [`Computed`](crate::Computed), cloning the listed captures.
///
/// ```
/// use observe_memo::{computed, Var};
///
/// let a = Var::new(1);
/// let double = computed!((a) cx => *a.get(cx) * 2);
/// a.set(4);
/// assert_eq!(double.read(), 8);
/// ```
#[macro_export]
macro_rules! computed {
    (( $($d_tt:tt)* ) $ctx:ident => $($b:tt)*) => {
        $crate::Computed::new($crate::macros::enclose!(($( $d_tt )*) Box::new(move |$ctx: &$crate::Evaluation| { $($b)* })))
    };
    ($ctx:ident => $($b:tt)*) => {
        $crate::Computed::new(Box::new(move |$ctx: &$crate::Evaluation| { $($b)* }))
    };
}

/// Build a [`Memoized`](crate::Memoized), cloning the listed captures.
/// The argument tuple is bound by reference.
///
/// ```
/// use observe_memo::{memoize, Var};
///
/// let offset = Var::new(10);
/// let shifted = memoize!((offset) cx, x: i64 => *x + *offset.get(cx));
/// assert_eq!(shifted.call(1), 11);
/// ```
#[macro_export]
macro_rules! memoize {
    (( $($d_tt:tt)* ) $ctx:ident, $args:ident : $ty:ty => $($b:tt)*) => {
        $crate::Memoized::new($crate::macros::enclose!(($( $d_tt )*) move |$ctx: &$crate::Evaluation, $args: &$ty| { $($b)* }))
    };
    ($ctx:ident, $args:ident : $ty:ty => $($b:tt)*) => {
        $crate::Memoized::new(move |$ctx: &$crate::Evaluation, $args: &$ty| { $($b)* })
    };
}
