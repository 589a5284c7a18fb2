use alloc::boxed::Box;
use core::any::Any;
use core::fmt;

use crate::{Shape, TypeMismatch};

/// Describes a value that may be absent, such as `Option<T>` or `OnceLock<T>`,
/// including a vtable to query and build it and the inner shape.
#[derive(Clone, Copy, Debug)]
pub struct OptionDef {
    /// presence checks and construction
    pub vtable: &'static OptionVTable,

    /// shape of the inner type
    pub t: fn() -> &'static Shape,
}

impl OptionDef {
    /// Const ctor.
    pub const fn new(vtable: &'static OptionVTable, t: fn() -> &'static Shape) -> Self {
        Self { vtable, t }
    }

    /// Returns the inner type shape.
    pub fn t(&self) -> &'static Shape {
        (self.t)()
    }
}

/// Borrow the contained value, or `None` when absent.
pub type OptionGetFn = for<'a> fn(&'a dyn Any) -> Result<Option<&'a dyn Any>, TypeMismatch>;

/// Build the absent value.
pub type OptionNoneFn = fn() -> Box<dyn Any>;

/// Wrap a present value.
pub type OptionSomeFn = fn(Box<dyn Any>) -> Result<Box<dyn Any>, TypeMismatch>;

/// Virtual table for option-like wrappers.
#[derive(Clone, Copy)]
pub struct OptionVTable {
    /// Borrow the contained value.
    pub get: OptionGetFn,
    /// Build the absent value.
    pub none: OptionNoneFn,
    /// Wrap a present value.
    pub some: OptionSomeFn,
}

impl fmt::Debug for OptionVTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionVTable").finish_non_exhaustive()
    }
}
