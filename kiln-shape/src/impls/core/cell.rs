use alloc::boxed::Box;
use core::any::Any;
use core::cell::OnceCell;

use crate::{Def, OptionDef, OptionVTable, Shape, Shaped, TypeMismatch, downcast, shape_of, unbox};

fn once_cell_get<T: Shaped>(value: &dyn Any) -> Result<Option<&dyn Any>, TypeMismatch> {
    Ok(downcast::<OnceCell<T>>(value)?
        .get()
        .map(|inner| inner as &dyn Any))
}

fn once_cell_none<T: Shaped>() -> Box<dyn Any> {
    Box::new(OnceCell::<T>::new())
}

fn once_cell_some<T: Shaped>(value: Box<dyn Any>) -> Result<Box<dyn Any>, TypeMismatch> {
    Ok(Box::new(OnceCell::from(unbox::<T>(value)?)))
}

// An uninitialized cell reads and writes as an absent value.
impl<T: Shaped> Shaped for OnceCell<T> {
    const SHAPE: &'static Shape = &const {
        Shape::new::<Self>(Def::Option(OptionDef::new(
            &const {
                OptionVTable {
                    get: once_cell_get::<T>,
                    none: once_cell_none::<T>,
                    some: once_cell_some::<T>,
                }
            },
            shape_of::<T>,
        )))
    };
}
