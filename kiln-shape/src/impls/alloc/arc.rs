use alloc::sync::Arc;
use alloc::boxed::Box;
use core::any::Any;

use crate::{
    Def, PointerDef, PointerKind, PointerVTable, Shape, Shaped, TypeMismatch, downcast, shape_of,
    unbox,
};

fn arc_borrow<T: Shaped>(value: &dyn Any) -> Result<&dyn Any, TypeMismatch> {
    Ok(&**downcast::<Arc<T>>(value)? as &dyn Any)
}

fn arc_new<T: Shaped>(value: Box<dyn Any>) -> Result<Box<dyn Any>, TypeMismatch> {
    Ok(Box::new(Arc::new(unbox::<T>(value)?)))
}

fn arc_address<T: Shaped>(value: &dyn Any) -> Result<usize, TypeMismatch> {
    Ok(Arc::as_ptr(downcast::<Arc<T>>(value)?) as usize)
}

impl<T: Shaped> Shaped for Arc<T> {
    const SHAPE: &'static Shape = &const {
        Shape::new::<Self>(Def::Pointer(PointerDef::new(
            &const {
                PointerVTable {
                    borrow: arc_borrow::<T>,
                    new: arc_new::<T>,
                    address: arc_address::<T>,
                }
            },
            PointerKind::Arc,
            shape_of::<T>,
        )))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_testhelpers::test;

    #[test]
    fn clones_share_an_address() {
        let Def::Pointer(def) = <Arc<i32>>::SHAPE.def else {
            panic!("expected a pointer def");
        };
        assert!(def.kind.is_shared());
        let a = Arc::new(1i32);
        let b = Arc::clone(&a);
        let c = Arc::new(1i32);
        let addr = |p: &Arc<i32>| (def.vtable.address)(p).unwrap();
        assert_eq!(addr(&a), addr(&b));
        assert_ne!(addr(&a), addr(&c));
    }
}
