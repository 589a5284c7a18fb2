use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use core::any::Any;

use crate::{
    Def, MapDef, MapEntries, MapVTable, Shape, Shaped, TypeMismatch, downcast, shape_of, unbox,
};

fn btreemap_len<K: Shaped, V: Shaped>(value: &dyn Any) -> Result<usize, TypeMismatch> {
    Ok(downcast::<BTreeMap<K, V>>(value)?.len())
}

fn btreemap_iter<K: Shaped, V: Shaped>(value: &dyn Any) -> Result<MapEntries<'_>, TypeMismatch> {
    let map = downcast::<BTreeMap<K, V>>(value)?;
    Ok(Box::new(
        map.iter().map(|(k, v)| (k as &dyn Any, v as &dyn Any)),
    ))
}

fn btreemap_collect<K: Shaped + Ord, V: Shaped>(
    entries: Vec<(Box<dyn Any>, Box<dyn Any>)>,
) -> Result<Box<dyn Any>, TypeMismatch> {
    let mut map = BTreeMap::new();
    for (k, v) in entries {
        map.insert(unbox::<K>(k)?, unbox::<V>(v)?);
    }
    Ok(Box::new(map))
}

impl<K: Shaped + Ord, V: Shaped> Shaped for BTreeMap<K, V> {
    const SHAPE: &'static Shape = &const {
        Shape::new::<Self>(Def::Map(MapDef::new(
            &const {
                MapVTable {
                    len: btreemap_len::<K, V>,
                    iter: btreemap_iter::<K, V>,
                    collect: btreemap_collect::<K, V>,
                }
            },
            shape_of::<K>,
            shape_of::<V>,
        )))
    };
}
