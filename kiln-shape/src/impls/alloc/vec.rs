use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;

use crate::{Def, ListDef, ListVTable, Shape, Shaped, TypeMismatch, downcast, shape_of, unbox_all};

fn vec_len<T: Shaped>(value: &dyn Any) -> Result<usize, TypeMismatch> {
    Ok(downcast::<Vec<T>>(value)?.len())
}

fn vec_get<T: Shaped>(value: &dyn Any, index: usize) -> Result<Option<&dyn Any>, TypeMismatch> {
    Ok(downcast::<Vec<T>>(value)?
        .get(index)
        .map(|item| item as &dyn Any))
}

fn vec_collect<T: Shaped>(items: Vec<Box<dyn Any>>) -> Result<Box<dyn Any>, TypeMismatch> {
    Ok(Box::new(unbox_all::<T>(items)?))
}

const fn build_list_vtable<T: Shaped>() -> ListVTable {
    ListVTable {
        len: vec_len::<T>,
        get: vec_get::<T>,
        collect: vec_collect::<T>,
    }
}

impl<T: Shaped> Shaped for Vec<T> {
    const SHAPE: &'static Shape = &const {
        Shape::new::<Self>(Def::List(ListDef::new(
            &const { build_list_vtable::<T>() },
            shape_of::<T>,
        )))
    };
}
