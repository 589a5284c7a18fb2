use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;

use crate::{
    Def, ListDef, ListVTable, PointerDef, PointerKind, PointerVTable, Shape, Shaped, TypeMismatch,
    downcast, shape_of, unbox, unbox_all,
};

fn box_borrow<T: Shaped>(value: &dyn Any) -> Result<&dyn Any, TypeMismatch> {
    Ok(&**downcast::<Box<T>>(value)? as &dyn Any)
}

fn box_new<T: Shaped>(value: Box<dyn Any>) -> Result<Box<dyn Any>, TypeMismatch> {
    Ok(Box::new(Box::new(unbox::<T>(value)?)))
}

fn box_address<T: Shaped>(value: &dyn Any) -> Result<usize, TypeMismatch> {
    Ok(&**downcast::<Box<T>>(value)? as *const T as usize)
}

impl<T: Shaped> Shaped for Box<T> {
    const SHAPE: &'static Shape = &const {
        Shape::new::<Self>(Def::Pointer(PointerDef::new(
            &const {
                PointerVTable {
                    borrow: box_borrow::<T>,
                    new: box_new::<T>,
                    address: box_address::<T>,
                }
            },
            PointerKind::Box,
            shape_of::<T>,
        )))
    };
}

fn boxed_slice_len<T: Shaped>(value: &dyn Any) -> Result<usize, TypeMismatch> {
    Ok(downcast::<Box<[T]>>(value)?.len())
}

fn boxed_slice_get<T: Shaped>(value: &dyn Any, index: usize) -> Result<Option<&dyn Any>, TypeMismatch> {
    Ok(downcast::<Box<[T]>>(value)?
        .get(index)
        .map(|item| item as &dyn Any))
}

fn boxed_slice_collect<T: Shaped>(items: Vec<Box<dyn Any>>) -> Result<Box<dyn Any>, TypeMismatch> {
    Ok(Box::new(unbox_all::<T>(items)?.into_boxed_slice()))
}

impl<T: Shaped> Shaped for Box<[T]> {
    const SHAPE: &'static Shape = &const {
        Shape::new::<Self>(Def::Array(ListDef::new(
            &const {
                ListVTable {
                    len: boxed_slice_len::<T>,
                    get: boxed_slice_get::<T>,
                    collect: boxed_slice_collect::<T>,
                }
            },
            shape_of::<T>,
        )))
    };
}
