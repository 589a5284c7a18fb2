//! Structural definitions carried by a [`Shape`](crate::Shape).

mod list;
pub use list::*;

mod map;
pub use map::*;

mod option;
pub use option::*;

mod pointer;
pub use pointer::*;

mod record;
pub use record::*;

mod scalar;
pub use scalar::*;

use crate::Shape;

/// The structural definition of a shape.
///
/// The last five variants describe types that exist in Rust but have no JSON
/// plan; serializers reject them when a plan is compiled, never per call.
#[derive(Clone, Copy, Debug)]
pub enum Def {
    /// A primitive value or a string, see [`ScalarKind`].
    Scalar(ScalarKind),

    /// A value that may be absent (`Option<T>`, `OnceLock<T>`, ...).
    Option(OptionDef),

    /// A heap reference (`Box<T>`, `Arc<T>`, `Rc<T>`).
    Pointer(PointerDef),

    /// A fixed sequence built once (`Box<[T]>`).
    Array(ListDef),

    /// A growable sequence (`Vec<T>`, `VecDeque<T>`).
    List(ListDef),

    /// A keyed collection (`HashMap<K, V>`, `BTreeMap<K, V>`, `IndexMap<K, V>`).
    Map(MapDef),

    /// A record with named members.
    Record(RecordDef),

    /// The "any" value, resolved per value at runtime.
    Dynamic,

    /// A sum type.
    Enum(EnumDef),

    /// A trait object or other abstract type with no concrete layout.
    Interface,

    /// An array with more than one dimension.
    MultiArray(MultiArrayDef),

    /// A function pointer or closure.
    Function,

    /// A placeholder for a type parameter that was never made concrete.
    Generic(GenericDef),
}

impl Def {
    /// Short human-readable name of the variant.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Def::Scalar(_) => "scalar",
            Def::Option(_) => "option",
            Def::Pointer(_) => "pointer",
            Def::Array(_) => "array",
            Def::List(_) => "list",
            Def::Map(_) => "map",
            Def::Record(_) => "record",
            Def::Dynamic => "dynamic",
            Def::Enum(_) => "enum",
            Def::Interface => "interface",
            Def::MultiArray(_) => "multi-dimensional array",
            Def::Function => "function",
            Def::Generic(_) => "generic parameter",
        }
    }
}

/// Definition of a sum type.
#[derive(Clone, Copy, Debug)]
pub struct EnumDef {
    /// Variant names, in declaration order.
    pub variants: &'static [&'static str],
}

/// Definition of a multi-dimensional array.
#[derive(Clone, Copy, Debug)]
pub struct MultiArrayDef {
    /// Number of dimensions (at least 2).
    pub rank: usize,
    /// Shape of the elements.
    pub item: fn() -> &'static Shape,
}

/// Definition of an unbound type parameter.
#[derive(Clone, Copy, Debug)]
pub struct GenericDef {
    /// Name of the parameter, e.g. `T`.
    pub param: &'static str,
}
