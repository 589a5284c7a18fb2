use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use crate::{Shape, TypeMismatch};

/// Fields for sequence types, used by both [`Def::Array`](crate::Def::Array)
/// and [`Def::List`](crate::Def::List).
#[derive(Clone, Copy, Debug)]
pub struct ListDef {
    /// length and element access
    pub vtable: &'static ListVTable,

    /// shape of the items
    pub t: fn() -> &'static Shape,
}

impl ListDef {
    /// Construct a `ListDef` from its vtable and item shape.
    pub const fn new(vtable: &'static ListVTable, t: fn() -> &'static Shape) -> Self {
        Self { vtable, t }
    }

    /// Returns the shape of the items.
    pub fn t(&self) -> &'static Shape {
        (self.t)()
    }
}

/// Number of items.
pub type ListLenFn = fn(&dyn Any) -> Result<usize, TypeMismatch>;

/// Borrow the item at `index`, or `None` if out of bounds.
pub type ListGetFn = for<'a> fn(&'a dyn Any, usize) -> Result<Option<&'a dyn Any>, TypeMismatch>;

/// Build a sequence from items in order.
pub type ListCollectFn = fn(Vec<Box<dyn Any>>) -> Result<Box<dyn Any>, TypeMismatch>;

/// Virtual table for sequences.
#[derive(Clone, Copy)]
pub struct ListVTable {
    /// Number of items.
    pub len: ListLenFn,
    /// Borrow one item.
    pub get: ListGetFn,
    /// Build from items.
    pub collect: ListCollectFn,
}

impl fmt::Debug for ListVTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListVTable").finish_non_exhaustive()
    }
}
