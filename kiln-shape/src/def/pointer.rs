use alloc::boxed::Box;
use core::any::Any;
use core::fmt;

use crate::{Shape, TypeMismatch};

/// Which smart pointer a [`PointerDef`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    /// `Box<T>`: unique ownership, never shared.
    Box,
    /// `Arc<T>`: shared, thread-safe reference counting.
    Arc,
    /// `Rc<T>`: shared, single-threaded reference counting.
    Rc,
}

impl PointerKind {
    /// Whether several owners may observe the same pointee.
    pub const fn is_shared(self) -> bool {
        matches!(self, PointerKind::Arc | PointerKind::Rc)
    }
}

/// Describes a heap reference and the shape it points to.
///
/// Pointers are how reference identity enters a value graph: two pointer values
/// with the same [`PointerVTable::address`] are the same object.
#[derive(Clone, Copy, Debug)]
pub struct PointerDef {
    /// borrow, construction and identity
    pub vtable: &'static PointerVTable,

    /// the smart pointer flavor
    pub kind: PointerKind,

    /// shape of the pointee
    pub pointee: fn() -> &'static Shape,
}

impl PointerDef {
    /// Const ctor.
    pub const fn new(
        vtable: &'static PointerVTable,
        kind: PointerKind,
        pointee: fn() -> &'static Shape,
    ) -> Self {
        Self {
            vtable,
            kind,
            pointee,
        }
    }

    /// Returns the pointee shape.
    pub fn pointee(&self) -> &'static Shape {
        (self.pointee)()
    }
}

/// Borrow the pointee.
pub type PointerBorrowFn = for<'a> fn(&'a dyn Any) -> Result<&'a dyn Any, TypeMismatch>;

/// Allocate a new pointer owning the given pointee.
pub type PointerNewFn = fn(Box<dyn Any>) -> Result<Box<dyn Any>, TypeMismatch>;

/// Address of the pointee, identifying the referenced object.
pub type PointerAddressFn = fn(&dyn Any) -> Result<usize, TypeMismatch>;

/// Virtual table for smart pointers.
#[derive(Clone, Copy)]
pub struct PointerVTable {
    /// Borrow the pointee.
    pub borrow: PointerBorrowFn,
    /// Allocate a new pointer.
    pub new: PointerNewFn,
    /// Identity of the pointee.
    pub address: PointerAddressFn,
}

impl fmt::Debug for PointerVTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointerVTable").finish_non_exhaustive()
    }
}
