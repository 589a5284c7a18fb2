use alloc::boxed::Box;
use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::any::Any;

use crate::{Def, ListDef, ListVTable, Shape, Shaped, TypeMismatch, downcast, shape_of, unbox_all};

fn vec_deque_len<T: Shaped>(value: &dyn Any) -> Result<usize, TypeMismatch> {
    Ok(downcast::<VecDeque<T>>(value)?.len())
}

fn vec_deque_get<T: Shaped>(
    value: &dyn Any,
    index: usize,
) -> Result<Option<&dyn Any>, TypeMismatch> {
    Ok(downcast::<VecDeque<T>>(value)?
        .get(index)
        .map(|item| item as &dyn Any))
}

fn vec_deque_collect<T: Shaped>(items: Vec<Box<dyn Any>>) -> Result<Box<dyn Any>, TypeMismatch> {
    Ok(Box::new(VecDeque::from(unbox_all::<T>(items)?)))
}

impl<T: Shaped> Shaped for VecDeque<T> {
    const SHAPE: &'static Shape = &const {
        Shape::new::<Self>(Def::List(ListDef::new(
            &const {
                ListVTable {
                    len: vec_deque_len::<T>,
                    get: vec_deque_get::<T>,
                    collect: vec_deque_collect::<T>,
                }
            },
            shape_of::<T>,
        )))
    };
}
