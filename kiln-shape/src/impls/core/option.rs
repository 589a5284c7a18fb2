use alloc::boxed::Box;
use core::any::Any;

use crate::{Def, OptionDef, OptionVTable, Shape, Shaped, TypeMismatch, downcast, shape_of, unbox};

fn option_get<T: Shaped>(value: &dyn Any) -> Result<Option<&dyn Any>, TypeMismatch> {
    Ok(downcast::<Option<T>>(value)?
        .as_ref()
        .map(|inner| inner as &dyn Any))
}

fn option_none<T: Shaped>() -> Box<dyn Any> {
    Box::new(None::<T>)
}

fn option_some<T: Shaped>(value: Box<dyn Any>) -> Result<Box<dyn Any>, TypeMismatch> {
    Ok(Box::new(Some(unbox::<T>(value)?)))
}

const fn build_option_vtable<T: Shaped>() -> OptionVTable {
    OptionVTable {
        get: option_get::<T>,
        none: option_none::<T>,
        some: option_some::<T>,
    }
}

impl<T: Shaped> Shaped for Option<T> {
    const SHAPE: &'static Shape = &const {
        Shape::new::<Self>(Def::Option(OptionDef::new(
            &const { build_option_vtable::<T>() },
            shape_of::<T>,
        )))
    };
}
