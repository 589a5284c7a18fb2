use core::any::{Any, TypeId};
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::Def;

/// `TypeId` equivalent usable in const contexts.
///
/// `TypeId::of` is not callable in a const initializer, but a pointer to it is,
/// so the id is resolved lazily on first comparison.
#[derive(Clone, Copy)]
pub struct ShapeId {
    type_id_fn: fn() -> TypeId,
}

impl ShapeId {
    /// Create a [`ShapeId`] for a type.
    pub const fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id_fn: TypeId::of::<T>,
        }
    }

    /// The underlying [`TypeId`].
    #[inline]
    pub fn get(self) -> TypeId {
        (self.type_id_fn)()
    }
}

impl PartialEq for ShapeId {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl Eq for ShapeId {}

impl Hash for ShapeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.get().hash(state);
    }
}

impl fmt::Debug for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.get(), f)
    }
}

/// Describes how a type looks to a serializer.
#[derive(Clone, Copy)]
pub struct Shape {
    /// Identity of the described type.
    pub id: ShapeId,

    /// Name of the described type, for diagnostics.
    pub type_name: fn() -> &'static str,

    /// Structural definition.
    pub def: Def,
}

impl Shape {
    /// Shape for `T` with the given definition, named after `T`.
    pub const fn new<T: ?Sized + 'static>(def: Def) -> Self {
        Self {
            id: ShapeId::of::<T>(),
            type_name: core::any::type_name::<T>,
            def,
        }
    }

    /// Name of the described type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Returns true if this shape describes `T`.
    #[inline]
    pub fn is_type<T: ?Sized + 'static>(&self) -> bool {
        self.id.get() == TypeId::of::<T>()
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Shape {}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("type", &self.type_name())
            .field("def", &self.def)
            .finish()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Types that carry a [`Shape`].
///
/// The shape is a `&'static` built in const context; nested shapes are
/// referenced through `fn() -> &'static Shape` (see [`shape_of`]) so type
/// graphs may be cyclic.
pub trait Shaped: Any {
    /// The shape of this type.
    const SHAPE: &'static Shape;
}

/// Function-pointer form of `T::SHAPE`, used wherever a shape refers to another.
pub fn shape_of<T: Shaped>() -> &'static Shape {
    T::SHAPE
}
