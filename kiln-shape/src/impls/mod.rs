// Shapes for scalars that map one-to-one onto a `ScalarKind`
macro_rules! impl_shaped_for_scalar {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl crate::Shaped for $ty {
                const SHAPE: &'static crate::Shape = &const {
                    crate::Shape::new::<$ty>(crate::Def::Scalar(crate::ScalarKind::$kind))
                };
            }
        )*
    };
}

mod alloc;
mod core;
// std-only types such as `HashMap` and `OnceLock`
mod std;
// third-party types
mod crates;
