//! Equality strategies for selector results.
//!
//! Selectors recompute their result on every read. Handing back the previous
//! allocation when nothing changed lets callers compare results by pointer.
//! The comparison is an explicit argument rather than a process-wide default.

use std::sync::Arc;

/// Decides whether two selector results are interchangeable.
pub trait Equality<T: ?Sized> {
    fn equals(&self, a: &T, b: &T) -> bool;
}

/// `PartialEq`-based deep comparison.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralEq;

impl<T: PartialEq + ?Sized> Equality<T> for StructuralEq {
    fn equals(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

/// Never equal: every read yields a fresh allocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFresh;

impl<T: ?Sized> Equality<T> for AlwaysFresh {
    fn equals(&self, _a: &T, _b: &T) -> bool {
        false
    }
}

impl<T: ?Sized, F> Equality<T> for F
where
    F: Fn(&T, &T) -> bool,
{
    fn equals(&self, a: &T, b: &T) -> bool {
        self(a, b)
    }
}

/// `prev` when it equals `next` under `eq`, otherwise `next` in a new `Arc`.
pub fn reuse_if_equal<T, E>(prev: Option<&Arc<T>>, next: T, eq: &E) -> Arc<T>
where
    E: Equality<T> + ?Sized,
{
    match prev {
        Some(prev) if eq.equals(prev, &next) => Arc::clone(prev),
        _ => Arc::new(next),
    }
}
