//! Helpers for crossing the type-erased value boundary.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

/// A type-erased value did not have the concrete type a descriptor expected.
///
/// This only happens when a hand-written descriptor is paired with the wrong
/// type, never because of input data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMismatch {
    /// The type the descriptor expected.
    pub expected: &'static str,
}

impl TypeMismatch {
    /// Mismatch for an expected `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self {
            expected: core::any::type_name::<T>(),
        }
    }
}

impl fmt::Display for TypeMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value is not a `{}`", self.expected)
    }
}

impl core::error::Error for TypeMismatch {}

/// Borrow an erased value as `T`.
#[inline]
pub fn downcast<T: Any>(value: &dyn Any) -> Result<&T, TypeMismatch> {
    value.downcast_ref::<T>().ok_or_else(TypeMismatch::of::<T>)
}

/// Mutably borrow an erased value as `T`.
#[inline]
pub fn downcast_mut<T: Any>(value: &mut dyn Any) -> Result<&mut T, TypeMismatch> {
    value.downcast_mut::<T>().ok_or_else(TypeMismatch::of::<T>)
}

/// Take an erased value back out of its box as `T`.
#[inline]
pub fn unbox<T: Any>(value: Box<dyn Any>) -> Result<T, TypeMismatch> {
    value
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| TypeMismatch::of::<T>())
}

/// Unbox every item of a collected list as `T`.
pub fn unbox_all<T: Any>(items: Vec<Box<dyn Any>>) -> Result<Vec<T>, TypeMismatch> {
    items.into_iter().map(unbox::<T>).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_testhelpers::test;

    #[test]
    fn downcast_reports_expected_type() {
        let value: Box<dyn Any> = Box::new(5u8);
        assert_eq!(*downcast::<u8>(&*value).unwrap(), 5);
        let err = downcast::<i64>(&*value).unwrap_err();
        assert_eq!(err.expected, "i64");
        assert_eq!(err.to_string(), "value is not a `i64`");
    }

    #[test]
    fn unbox_moves_value_out() {
        let value: Box<dyn Any> = Box::new(String::from("kiln"));
        assert_eq!(unbox::<String>(value).unwrap(), "kiln");
        let items: Vec<Box<dyn Any>> = alloc::vec![Box::new(1i32), Box::new(2i32)];
        assert_eq!(unbox_all::<i32>(items).unwrap(), [1, 2]);
    }
}
