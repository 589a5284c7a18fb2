//! Function pointers have a shape so records holding them can be described,
//! but no serializer will build a plan for one.

use crate::{Def, Shape, Shaped};

macro_rules! impl_shaped_for_fn_ptr {
    ($(($($args:ident),*)),* $(,)?) => {
        $(
            impl<$($args: 'static,)* R: 'static> Shaped for fn($($args),*) -> R {
                const SHAPE: &'static Shape = &const { Shape::new::<Self>(Def::Function) };
            }
        )*
    };
}

impl_shaped_for_fn_ptr! {
    (),
    (A),
    (A, B),
    (A, B, C),
}
