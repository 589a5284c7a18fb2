#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

extern crate alloc;

#[macro_use]
mod log;

use std::sync::LazyLock;

use alloc::string::String;

pub mod chars;
mod compiler;
mod context;
mod deserialize;
mod engine;
mod error;
mod guard;
mod naming;
mod options;
mod plan;
pub mod read;
mod serialize;
pub mod source;
mod trie;
pub mod write;

pub use kiln_shape::{self, Dynamic, Shaped, record};

pub use context::Concurrency;
pub use engine::{Deserializer, Engine, Serializer};
pub use error::{
    ArgumentError, CompileError, CompileErrorKind, Error, JsonError, JsonErrorKind,
    SerializeError, Span, Unsupported,
};
pub use guard::CycleGuard;
pub use naming::{DeclaredNames, NamingStrategy, Overrides, RenameAll, RenameRule};
pub use options::EngineOptions;
pub use plan::{Direction, Program};
pub use trie::{CompiledTrie, SyntaxTrie, TrieError};

static DEFAULT_ENGINE: LazyLock<Engine> = LazyLock::new(Engine::new);

/// Serialize a value to a JSON string with the default engine.
///
/// # Example
///
/// ```
/// #[derive(Default)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// kiln_shape::record!(Person {
///     name: String,
///     age: u32,
/// });
///
/// let json = kiln_json::to_string(&Person { name: "Bart".into(), age: 21 }).unwrap();
/// assert_eq!(json, r#"{"name":"Bart","age":21}"#);
/// ```
pub fn to_string<T: Shaped>(value: &T) -> Result<String, Error> {
    DEFAULT_ENGINE
        .serializer::<T>(Concurrency::ThreadSafe)?
        .serialize(value)
}

/// Deserialize a value from a JSON string with the default engine.
///
/// # Example
///
/// ```
/// let numbers: Vec<f64> = kiln_json::from_str(" [1, -2, 3e2] ").unwrap();
/// assert_eq!(numbers, [1.0, -2.0, 300.0]);
///
/// // integers take no fraction or exponent
/// assert!(kiln_json::from_str::<Vec<i64>>("[3e2]").is_err());
/// ```
pub fn from_str<T: Shaped>(text: &str) -> Result<T, Error> {
    DEFAULT_ENGINE
        .deserializer::<T>(Concurrency::ThreadSafe)?
        .deserialize(text)
}
