//! Crate-internal event macros.
//!
//! Each expands to the matching `tracing` macro when the `tracing` feature is
//! on and to an empty block otherwise, so call sites need no `cfg` of their own.

macro_rules! trace {
    ($($event:tt)*) => {{
        #[cfg(feature = "tracing")]
        ::tracing::trace!($($event)*);
    }};
}

macro_rules! debug {
    ($($event:tt)*) => {{
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($event)*);
    }};
}
