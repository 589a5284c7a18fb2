use std::hash::{BuildHasher, Hash};

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;

use indexmap::IndexMap;

use crate::{
    Def, MapDef, MapEntries, MapVTable, Shape, Shaped, TypeMismatch, downcast, shape_of, unbox,
};

fn indexmap_len<K: Shaped, V: Shaped, S: 'static>(value: &dyn Any) -> Result<usize, TypeMismatch> {
    Ok(downcast::<IndexMap<K, V, S>>(value)?.len())
}

fn indexmap_iter<K: Shaped, V: Shaped, S: 'static>(
    value: &dyn Any,
) -> Result<MapEntries<'_>, TypeMismatch> {
    let map = downcast::<IndexMap<K, V, S>>(value)?;
    Ok(Box::new(
        map.iter().map(|(k, v)| (k as &dyn Any, v as &dyn Any)),
    ))
}

// A repeated key keeps its first position and its last value.
fn indexmap_collect<K, V, S>(
    entries: Vec<(Box<dyn Any>, Box<dyn Any>)>,
) -> Result<Box<dyn Any>, TypeMismatch>
where
    K: Shaped + Eq + Hash,
    V: Shaped,
    S: BuildHasher + Default + 'static,
{
    let mut map = IndexMap::with_capacity_and_hasher(entries.len(), S::default());
    for (k, v) in entries {
        map.insert(unbox::<K>(k)?, unbox::<V>(v)?);
    }
    Ok(Box::new(map))
}

impl<K, V, S> Shaped for IndexMap<K, V, S>
where
    K: Shaped + Eq + Hash,
    V: Shaped,
    S: BuildHasher + Default + 'static,
{
    const SHAPE: &'static Shape = &const {
        Shape::new::<Self>(Def::Map(MapDef::new(
            &const {
                MapVTable {
                    len: indexmap_len::<K, V, S>,
                    iter: indexmap_iter::<K, V, S>,
                    collect: indexmap_collect::<K, V, S>,
                }
            },
            shape_of::<K>,
            shape_of::<V>,
        )))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use kiln_testhelpers::test;

    #[test]
    fn iteration_follows_insertion_order() {
        let Def::Map(def) = <IndexMap<String, u8>>::SHAPE.def else {
            panic!("expected a map def");
        };
        assert!(def.k().is_type::<String>());
        let mut map = IndexMap::new();
        map.insert(String::from("z"), 1u8);
        map.insert(String::from("a"), 2u8);
        let keys: Vec<&str> = (def.vtable.iter)(&map)
            .unwrap()
            .map(|(k, _)| downcast::<String>(k).unwrap().as_str())
            .collect();
        assert_eq!(keys, ["z", "a"]);
    }
}
