use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use crate::{Shape, TypeMismatch};

/// Fields for map types.
#[derive(Clone, Copy, Debug)]
pub struct MapDef {
    /// entry iteration and insertion
    pub vtable: &'static MapVTable,

    /// shape of the keys
    pub k: fn() -> &'static Shape,

    /// shape of the values
    pub v: fn() -> &'static Shape,
}

impl MapDef {
    /// Construct a `MapDef` from its vtable and key/value shapes.
    pub const fn new(
        vtable: &'static MapVTable,
        k: fn() -> &'static Shape,
        v: fn() -> &'static Shape,
    ) -> Self {
        Self { vtable, k, v }
    }

    /// Returns the shape of the keys.
    pub fn k(&self) -> &'static Shape {
        (self.k)()
    }

    /// Returns the shape of the values.
    pub fn v(&self) -> &'static Shape {
        (self.v)()
    }
}

/// Iterator over borrowed entries of an erased map.
pub type MapEntries<'a> = Box<dyn Iterator<Item = (&'a dyn Any, &'a dyn Any)> + 'a>;

/// Number of entries.
pub type MapLenFn = fn(&dyn Any) -> Result<usize, TypeMismatch>;

/// Iterate the entries in the map's own order.
pub type MapIterFn = for<'a> fn(&'a dyn Any) -> Result<MapEntries<'a>, TypeMismatch>;

/// Build a map from entries; later entries replace earlier ones with equal keys.
pub type MapCollectFn = fn(Vec<(Box<dyn Any>, Box<dyn Any>)>) -> Result<Box<dyn Any>, TypeMismatch>;

/// Virtual table for maps.
#[derive(Clone, Copy)]
pub struct MapVTable {
    /// Number of entries.
    pub len: MapLenFn,
    /// Iterate entries.
    pub iter: MapIterFn,
    /// Build from entries.
    pub collect: MapCollectFn,
}

impl fmt::Debug for MapVTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapVTable").finish_non_exhaustive()
    }
}
