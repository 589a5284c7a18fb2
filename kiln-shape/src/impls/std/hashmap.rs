use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;

use crate::{
    Def, MapDef, MapEntries, MapVTable, Shape, Shaped, TypeMismatch, downcast, shape_of, unbox,
};

fn hashmap_len<K: Shaped, V: Shaped, S: 'static>(value: &dyn Any) -> Result<usize, TypeMismatch> {
    Ok(downcast::<HashMap<K, V, S>>(value)?.len())
}

fn hashmap_iter<K: Shaped, V: Shaped, S: 'static>(
    value: &dyn Any,
) -> Result<MapEntries<'_>, TypeMismatch> {
    let map = downcast::<HashMap<K, V, S>>(value)?;
    Ok(Box::new(
        map.iter().map(|(k, v)| (k as &dyn Any, v as &dyn Any)),
    ))
}

fn hashmap_collect<K, V, S>(
    entries: Vec<(Box<dyn Any>, Box<dyn Any>)>,
) -> Result<Box<dyn Any>, TypeMismatch>
where
    K: Shaped + Eq + Hash,
    V: Shaped,
    S: BuildHasher + Default + 'static,
{
    let mut map = HashMap::with_capacity_and_hasher(entries.len(), S::default());
    for (k, v) in entries {
        map.insert(unbox::<K>(k)?, unbox::<V>(v)?);
    }
    Ok(Box::new(map))
}

impl<K, V, S> Shaped for HashMap<K, V, S>
where
    K: Shaped + Eq + Hash,
    V: Shaped,
    S: BuildHasher + Default + 'static,
{
    const SHAPE: &'static Shape = &const {
        Shape::new::<Self>(Def::Map(MapDef::new(
            &const {
                MapVTable {
                    len: hashmap_len::<K, V, S>,
                    iter: hashmap_iter::<K, V, S>,
                    collect: hashmap_collect::<K, V, S>,
                }
            },
            shape_of::<K>,
            shape_of::<V>,
        )))
    };
}
