use alloc::rc::Rc;
use alloc::boxed::Box;
use core::any::Any;

use crate::{
    Def, PointerDef, PointerKind, PointerVTable, Shape, Shaped, TypeMismatch, downcast, shape_of,
    unbox,
};

fn rc_borrow<T: Shaped>(value: &dyn Any) -> Result<&dyn Any, TypeMismatch> {
    Ok(&**downcast::<Rc<T>>(value)? as &dyn Any)
}

fn rc_new<T: Shaped>(value: Box<dyn Any>) -> Result<Box<dyn Any>, TypeMismatch> {
    Ok(Box::new(Rc::new(unbox::<T>(value)?)))
}

fn rc_address<T: Shaped>(value: &dyn Any) -> Result<usize, TypeMismatch> {
    Ok(Rc::as_ptr(downcast::<Rc<T>>(value)?) as usize)
}

impl<T: Shaped> Shaped for Rc<T> {
    const SHAPE: &'static Shape = &const {
        Shape::new::<Self>(Def::Pointer(PointerDef::new(
            &const {
                PointerVTable {
                    borrow: rc_borrow::<T>,
                    new: rc_new::<T>,
                    address: rc_address::<T>,
                }
            },
            PointerKind::Rc,
            shape_of::<T>,
        )))
    };
}
