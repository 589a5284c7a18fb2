//! Error types for plan compilation, serialization and parsing.

use alloc::string::String;
use core::fmt::{self, Display};

use kiln_shape::TypeMismatch;

/// A byte range in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Offset of the first byte.
    pub offset: usize,
    /// Number of bytes covered.
    pub len: usize,
}

impl Span {
    /// Create a span.
    pub const fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// A zero-width span at `offset`.
    pub const fn at(offset: usize) -> Self {
        Self { offset, len: 0 }
    }
}

/// Error type for JSON parsing: what went wrong, and where.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonError {
    /// The specific kind of error
    pub kind: JsonErrorKind,
    /// Where in the input it happened
    pub span: Span,
}

impl JsonError {
    /// An error of `kind` at `span`.
    pub const fn new(kind: JsonErrorKind, span: Span) -> Self {
        JsonError { kind, span }
    }

    /// Input position at which the error was detected.
    pub const fn offset(&self) -> usize {
        self.span.offset
    }
}

impl Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.span.offset)
    }
}

impl std::error::Error for JsonError {}

/// Specific error kinds for JSON parsing
#[derive(Debug, Clone, PartialEq)]
pub enum JsonErrorKind {
    /// A byte that cannot start or continue the expected token
    UnexpectedChar {
        /// The byte that was found
        got: u8,
        /// What was expected instead
        expected: &'static str,
    },
    /// Input ended in the middle of a value
    UnexpectedEof {
        /// What was expected before the end
        expected: &'static str,
    },
    /// A number that does not follow the JSON number grammar, or a fraction
    /// or exponent where an integer was expected
    InvalidNumber {
        /// What was expected
        expected: &'static str,
    },
    /// A well-formed number the target type cannot represent
    NumberOutOfRange {
        /// The numeric text as it appeared
        value: String,
        /// The type that was being read
        target_type: &'static str,
    },
    /// An unknown escape sequence, or a `\u` not followed by four hex digits
    InvalidEscape,
    /// A lone or misordered UTF-16 surrogate in a `\u` escape
    InvalidSurrogate,
    /// A raw control character inside a string literal
    ControlCharacter(u8),
    /// A string literal that is not valid UTF-8
    InvalidUtf8,
    /// A string that must hold exactly one character did not
    InvalidChar,
    /// A string that is not a valid date-time
    InvalidDateTime {
        /// The string as decoded
        value: String,
    },
    /// A `,` directly before `]` or `}`
    TrailingComma,
    /// Something other than whitespace after the root value
    TrailingCharacters,
    /// Nesting deeper than the configured limit
    DepthLimitExceeded {
        /// The configured limit
        limit: usize,
    },
    /// I/O error while reading a stream
    Io(String),
}

impl Display for JsonErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonErrorKind::UnexpectedChar { got, expected } => {
                write!(f, "unexpected '{}', expected {expected}", got.escape_ascii())
            }
            JsonErrorKind::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input, expected {expected}")
            }
            JsonErrorKind::InvalidNumber { expected } => {
                write!(f, "invalid number, expected {expected}")
            }
            JsonErrorKind::NumberOutOfRange { value, target_type } => {
                write!(f, "number `{value}` out of range for {target_type}")
            }
            JsonErrorKind::InvalidEscape => write!(f, "invalid escape sequence"),
            JsonErrorKind::InvalidSurrogate => write!(f, "unpaired UTF-16 surrogate"),
            JsonErrorKind::ControlCharacter(b) => {
                write!(f, "unescaped control character {b:#04x} in string")
            }
            JsonErrorKind::InvalidUtf8 => write!(f, "invalid UTF-8 sequence"),
            JsonErrorKind::InvalidChar => write!(f, "expected a string of exactly one character"),
            JsonErrorKind::InvalidDateTime { value } => {
                write!(f, "`{value}` is not a valid date-time")
            }
            JsonErrorKind::TrailingComma => write!(f, "trailing comma"),
            JsonErrorKind::TrailingCharacters => write!(f, "trailing characters after value"),
            JsonErrorKind::DepthLimitExceeded { limit } => {
                write!(f, "nesting exceeds the depth limit of {limit}")
            }
            JsonErrorKind::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl JsonErrorKind {
    /// Stable `json::` code, for matching in tests and logs.
    pub const fn code(&self) -> &'static str {
        match self {
            JsonErrorKind::UnexpectedChar { .. } => "json::unexpected_char",
            JsonErrorKind::UnexpectedEof { .. } => "json::unexpected_eof",
            JsonErrorKind::InvalidNumber { .. } => "json::invalid_number",
            JsonErrorKind::NumberOutOfRange { .. } => "json::number_out_of_range",
            JsonErrorKind::InvalidEscape => "json::invalid_escape",
            JsonErrorKind::InvalidSurrogate => "json::invalid_surrogate",
            JsonErrorKind::ControlCharacter(_) => "json::control_character",
            JsonErrorKind::InvalidUtf8 => "json::invalid_utf8",
            JsonErrorKind::InvalidChar => "json::invalid_char",
            JsonErrorKind::InvalidDateTime { .. } => "json::invalid_date_time",
            JsonErrorKind::TrailingComma => "json::trailing_comma",
            JsonErrorKind::TrailingCharacters => "json::trailing_characters",
            JsonErrorKind::DepthLimitExceeded { .. } => "json::depth_limit_exceeded",
            JsonErrorKind::Io(_) => "json::io",
        }
    }
}

/// Why a shape has no plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsupported {
    /// Sum types
    Enum,
    /// Trait objects and other types with no concrete layout
    Interface,
    /// Arrays of rank 2 or more
    MultiArray {
        /// Number of dimensions
        rank: usize,
    },
    /// Function pointers and closures
    Function,
    /// A type parameter that was never made concrete
    OpenGeneric {
        /// Name of the parameter
        param: &'static str,
    },
    /// A map whose keys are not strings
    NonStringKey {
        /// The key type
        key: &'static str,
    },
    /// A record read from JSON without a way to construct it
    NoConstructor,
}

impl Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unsupported::Enum => write!(f, "enums are not supported"),
            Unsupported::Interface => write!(f, "interface types have no concrete shape"),
            Unsupported::MultiArray { rank } => {
                write!(f, "{rank}-dimensional arrays are not supported")
            }
            Unsupported::Function => write!(f, "functions cannot be serialized"),
            Unsupported::OpenGeneric { param } => {
                write!(f, "type parameter `{param}` is not concrete")
            }
            Unsupported::NonStringKey { key } => {
                write!(f, "map keys must be strings, found `{key}`")
            }
            Unsupported::NoConstructor => write!(f, "record has no constructor"),
        }
    }
}

/// What went wrong while compiling a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// The shape (or a shape it contains) cannot be serialized
    Unsupported(Unsupported),
    /// Two members of one record claim the same JSON name
    DuplicateName {
        /// The contested name
        name: String,
    },
    /// A naming strategy produced an empty name, or no names at all
    EmptyName {
        /// Declared name of the member
        member: &'static str,
    },
}

/// A shape could not be compiled into a plan.
///
/// Raised when a serializer or deserializer is created, never by an
/// individual call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// What went wrong
    pub kind: CompileErrorKind,
    /// The shape at fault
    pub type_name: &'static str,
    /// Where the shape sits below the root, e.g. `$.friends[].address`
    pub path: String,
}

impl CompileError {
    /// Stable `json::` code of the compile failure.
    pub const fn code(&self) -> &'static str {
        match self.kind {
            CompileErrorKind::Unsupported(_) => "json::unsupported_shape",
            CompileErrorKind::DuplicateName { .. } => "json::duplicate_name",
            CompileErrorKind::EmptyName { .. } => "json::empty_name",
        }
    }
}

impl Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CompileErrorKind::Unsupported(reason) => {
                write!(f, "cannot compile `{}` at {}: {reason}", self.type_name, self.path)
            }
            CompileErrorKind::DuplicateName { name } => write!(
                f,
                "record `{}` at {} has more than one member named `{name}`",
                self.type_name, self.path
            ),
            CompileErrorKind::EmptyName { member } => write!(
                f,
                "member `{member}` of `{}` at {} has no usable name",
                self.type_name, self.path
            ),
        }
    }
}

impl std::error::Error for CompileError {}

/// Errors raised while writing a value.
#[derive(Debug)]
pub enum SerializeError {
    /// A shared reference was reached again while it was still being written
    Cycle {
        /// The type behind the reference that closed the cycle
        type_name: &'static str,
    },
    /// NaN or an infinity, which JSON cannot represent
    NonFiniteFloat {
        /// The offending value
        value: f64,
    },
    /// A value outside what its JSON form can express
    InvalidValue {
        /// The type of the value
        type_name: &'static str,
        /// Why it cannot be written
        reason: &'static str,
    },
    /// A dynamic value whose runtime shape cannot be compiled
    UnsupportedType {
        /// The runtime type
        type_name: &'static str,
        /// Why its plan failed to compile
        source: CompileError,
    },
    /// Nesting deeper than the configured limit
    DepthLimitExceeded {
        /// The configured limit
        limit: usize,
    },
    /// The output sink failed
    Io(std::io::Error),
}

impl Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializeError::Cycle { type_name } => {
                write!(f, "cyclic reference through `{type_name}`")
            }
            SerializeError::NonFiniteFloat { value } => {
                write!(f, "{value} has no JSON representation")
            }
            SerializeError::InvalidValue { type_name, reason } => {
                write!(f, "cannot write `{type_name}`: {reason}")
            }
            SerializeError::UnsupportedType { type_name, source } => {
                write!(f, "unsupported runtime type `{type_name}`: {source}")
            }
            SerializeError::DepthLimitExceeded { limit } => {
                write!(f, "nesting exceeds the depth limit of {limit}")
            }
            SerializeError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for SerializeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SerializeError::UnsupportedType { source, .. } => Some(source),
            SerializeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// An argument rejected at the public boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentError {
    /// The argument at fault
    pub argument: &'static str,
    /// What is wrong with it
    pub reason: String,
}

impl ArgumentError {
    pub(crate) fn new(argument: &'static str, reason: impl Into<String>) -> Self {
        Self {
            argument,
            reason: reason.into(),
        }
    }
}

impl Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid `{}`: {}", self.argument, self.reason)
    }
}

impl std::error::Error for ArgumentError {}

/// Any error the engine can report.
///
/// Parse errors come from untrusted input; the other variants point at
/// the program itself.
#[derive(Debug)]
pub enum Error {
    /// Malformed or out-of-range input
    Parse(JsonError),
    /// A shape without a plan
    Compile(CompileError),
    /// A value that could not be written
    Serialize(SerializeError),
    /// An invalid option or override
    Argument(ArgumentError),
    /// A shape descriptor paired with the wrong concrete type
    Shape(TypeMismatch),
}

impl Error {
    /// True for errors caused by the input text.
    pub const fn is_parse(&self) -> bool {
        matches!(self, Error::Parse(_))
    }

    /// True for plan compilation failures.
    pub const fn is_compile(&self) -> bool {
        matches!(self, Error::Compile(_))
    }

    /// True for failures while writing a value.
    pub const fn is_serialize(&self) -> bool {
        matches!(self, Error::Serialize(_))
    }

    /// True for rejected arguments.
    pub const fn is_argument(&self) -> bool {
        matches!(self, Error::Argument(_))
    }

    /// True if a value was found to reference itself.
    pub const fn is_cycle(&self) -> bool {
        matches!(self, Error::Serialize(SerializeError::Cycle { .. }))
    }

    /// The parse error, if this is one.
    pub const fn as_parse(&self) -> Option<&JsonError> {
        match self {
            Error::Parse(e) => Some(e),
            _ => None,
        }
    }

    /// The compile error, if this is one.
    pub const fn as_compile(&self) -> Option<&CompileError> {
        match self {
            Error::Compile(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => Display::fmt(e, f),
            Error::Compile(e) => Display::fmt(e, f),
            Error::Serialize(e) => Display::fmt(e, f),
            Error::Argument(e) => Display::fmt(e, f),
            Error::Shape(e) => write!(f, "shape mismatch: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Compile(e) => Some(e),
            Error::Serialize(e) => Some(e),
            Error::Argument(e) => Some(e),
            Error::Shape(e) => Some(e),
        }
    }
}

impl From<JsonError> for Error {
    fn from(err: JsonError) -> Self {
        Error::Parse(err)
    }
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        Error::Compile(err)
    }
}

impl From<SerializeError> for Error {
    fn from(err: SerializeError) -> Self {
        Error::Serialize(err)
    }
}

impl From<ArgumentError> for Error {
    fn from(err: ArgumentError) -> Self {
        Error::Argument(err)
    }
}

impl From<TypeMismatch> for Error {
    fn from(err: TypeMismatch) -> Self {
        Error::Shape(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_testhelpers::test;

    #[test]
    fn parse_errors_report_their_offset() {
        let err = JsonError::new(
            JsonErrorKind::UnexpectedChar {
                got: b'x',
                expected: "a value",
            },
            Span::new(7, 1),
        );
        assert_eq!(err.to_string(), "unexpected 'x', expected a value at offset 7");
        assert_eq!(err.kind.code(), "json::unexpected_char");

        let err = Error::from(err);
        assert!(err.is_parse());
        assert!(!err.is_compile());
        assert_eq!(err.as_parse().map(JsonError::offset), Some(7));
    }

    #[test]
    fn compile_errors_name_the_path() {
        let err = CompileError {
            kind: CompileErrorKind::Unsupported(Unsupported::MultiArray { rank: 2 }),
            type_name: "Grid",
            path: "$.cells".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot compile `Grid` at $.cells: 2-dimensional arrays are not supported"
        );
        assert_eq!(err.code(), "json::unsupported_shape");
    }
}
