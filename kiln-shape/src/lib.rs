#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

extern crate alloc;

mod shape;
pub use shape::*;

mod erased;
pub use erased::*;

mod def;
pub use def::*;

mod dynamic;
pub use dynamic::*;

mod impls;

mod macros;

#[doc(hidden)]
pub mod __private {
    pub use alloc::boxed::Box;
}
