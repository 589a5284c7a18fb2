use std::sync::OnceLock;

use alloc::boxed::Box;
use core::any::Any;

use crate::{Def, OptionDef, OptionVTable, Shape, Shaped, TypeMismatch, downcast, shape_of, unbox};

fn once_lock_get<T: Shaped>(value: &dyn Any) -> Result<Option<&dyn Any>, TypeMismatch> {
    Ok(downcast::<OnceLock<T>>(value)?
        .get()
        .map(|inner| inner as &dyn Any))
}

fn once_lock_none<T: Shaped>() -> Box<dyn Any> {
    Box::new(OnceLock::<T>::new())
}

fn once_lock_some<T: Shaped>(value: Box<dyn Any>) -> Result<Box<dyn Any>, TypeMismatch> {
    Ok(Box::new(OnceLock::from(unbox::<T>(value)?)))
}

// An uninitialized lock reads and writes as an absent value. Setting a lock
// after its owner is shared is how cyclic `Arc` graphs get built.
impl<T: Shaped> Shaped for OnceLock<T> {
    const SHAPE: &'static Shape = &const {
        Shape::new::<Self>(Def::Option(OptionDef::new(
            &const {
                OptionVTable {
                    get: once_lock_get::<T>,
                    none: once_lock_none::<T>,
                    some: once_lock_some::<T>,
                }
            },
            shape_of::<T>,
        )))
    };
}
