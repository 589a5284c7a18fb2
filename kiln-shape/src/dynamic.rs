//! The "any" value.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use indexmap::IndexMap;

use crate::{Def, Shape, Shaped};

/// A value that knows its own shape at runtime.
///
/// Implemented for every [`Shaped`] type that is `Send + Sync`; it is what
/// [`Dynamic::Typed`] stores so a serializer can dispatch on the runtime type.
pub trait Reflect: Any + Send + Sync {
    /// Shape of the concrete value.
    fn shape(&self) -> &'static Shape;

    /// The value, erased.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Shaped + Send + Sync> Reflect for T {
    fn shape(&self) -> &'static Shape {
        T::SHAPE
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A value whose structure is only known at runtime.
///
/// Reading JSON into a `Dynamic` produces only the first six variants:
/// numbers always become `f64`, objects keep member order. `Typed` exists for
/// writing arbitrary shaped values through a dynamic slot.
#[derive(Clone, Default)]
pub enum Dynamic {
    /// `null`
    #[default]
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Any JSON number.
    Number(f64),
    /// A string.
    String(String),
    /// An array of dynamic values.
    Array(Vec<Dynamic>),
    /// An object; member order is preserved.
    Object(IndexMap<String, Dynamic>),
    /// A shaped value, written through its own plan.
    Typed(Arc<dyn Reflect>),
}

impl Dynamic {
    /// Wrap a shaped value.
    pub fn typed<T: Shaped + Send + Sync>(value: T) -> Self {
        Dynamic::Typed(Arc::new(value))
    }

    /// Returns true for `Dynamic::Null`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Dynamic::Null)
    }

    /// The boolean, if this is one.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Dynamic::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The number, if this is one.
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Dynamic::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    /// The array, if this is one.
    pub fn as_array(&self) -> Option<&[Dynamic]> {
        match self {
            Dynamic::Array(items) => Some(items),
            _ => None,
        }
    }

    /// The object, if this is one.
    pub fn as_object(&self) -> Option<&IndexMap<String, Dynamic>> {
        match self {
            Dynamic::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Member lookup on objects.
    pub fn get(&self, key: &str) -> Option<&Dynamic> {
        self.as_object().and_then(|map| map.get(key))
    }
}

impl Shaped for Dynamic {
    const SHAPE: &'static Shape = &const { Shape::new::<Self>(Def::Dynamic) };
}

impl PartialEq for Dynamic {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Dynamic::Null, Dynamic::Null) => true,
            (Dynamic::Bool(a), Dynamic::Bool(b)) => a == b,
            (Dynamic::Number(a), Dynamic::Number(b)) => a == b,
            (Dynamic::String(a), Dynamic::String(b)) => a == b,
            (Dynamic::Array(a), Dynamic::Array(b)) => a == b,
            (Dynamic::Object(a), Dynamic::Object(b)) => a == b,
            // typed values have no structural equality; identity is all we can compare
            (Dynamic::Typed(a), Dynamic::Typed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dynamic::Null => f.write_str("Null"),
            Dynamic::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Dynamic::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Dynamic::String(s) => f.debug_tuple("String").field(s).finish(),
            Dynamic::Array(items) => f.debug_tuple("Array").field(items).finish(),
            Dynamic::Object(map) => f.debug_tuple("Object").field(map).finish(),
            Dynamic::Typed(value) => f
                .debug_tuple("Typed")
                .field(&value.shape().type_name())
                .finish(),
        }
    }
}

impl From<bool> for Dynamic {
    fn from(value: bool) -> Self {
        Dynamic::Bool(value)
    }
}

impl From<f64> for Dynamic {
    fn from(value: f64) -> Self {
        Dynamic::Number(value)
    }
}

impl From<&str> for Dynamic {
    fn from(value: &str) -> Self {
        Dynamic::String(value.into())
    }
}

impl From<String> for Dynamic {
    fn from(value: String) -> Self {
        Dynamic::String(value)
    }
}

impl From<Vec<Dynamic>> for Dynamic {
    fn from(value: Vec<Dynamic>) -> Self {
        Dynamic::Array(value)
    }
}

impl From<IndexMap<String, Dynamic>> for Dynamic {
    fn from(value: IndexMap<String, Dynamic>) -> Self {
        Dynamic::Object(value)
    }
}

impl FromIterator<(String, Dynamic)> for Dynamic {
    fn from_iter<I: IntoIterator<Item = (String, Dynamic)>>(iter: I) -> Self {
        Dynamic::Object(iter.into_iter().collect())
    }
}
