use core::fmt;

/// The primitive kinds a [`Def::Scalar`](crate::Def::Scalar) may carry.
///
/// Each kind names exactly one concrete Rust type; an erased scalar value is
/// always that type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// `bool`
    Bool,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `i128`
    I128,
    /// `isize`
    Isize,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `u128`
    U128,
    /// `usize`
    Usize,
    /// `f32`
    F32,
    /// `f64`
    F64,
    /// `rust_decimal::Decimal`
    Decimal,
    /// `char`
    Char,
    /// `String`
    String,
    /// `chrono::DateTime<Utc>`
    DateTime,
    /// `chrono::DateTime<FixedOffset>`
    DateTimeOffset,
}

impl ScalarKind {
    /// Name of the concrete type this kind stands for.
    pub const fn type_name(self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::I8 => "i8",
            ScalarKind::I16 => "i16",
            ScalarKind::I32 => "i32",
            ScalarKind::I64 => "i64",
            ScalarKind::I128 => "i128",
            ScalarKind::Isize => "isize",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::U128 => "u128",
            ScalarKind::Usize => "usize",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
            ScalarKind::Decimal => "Decimal",
            ScalarKind::Char => "char",
            ScalarKind::String => "String",
            ScalarKind::DateTime => "DateTime<Utc>",
            ScalarKind::DateTimeOffset => "DateTime<FixedOffset>",
        }
    }

    /// Whether values of this kind are written as JSON numbers.
    pub const fn is_numeric(self) -> bool {
        !matches!(
            self,
            ScalarKind::Bool
                | ScalarKind::Char
                | ScalarKind::String
                | ScalarKind::DateTime
                | ScalarKind::DateTimeOffset
        )
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}
