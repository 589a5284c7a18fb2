//! Plan cache and typed entry points.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};
use core::fmt;
use core::marker::PhantomData;
use std::collections::HashMap;
use std::io::{self, BufWriter};
use std::sync::OnceLock;

use kiln_shape::{Shape, Shaped, unbox};
use parking_lot::Mutex;

use crate::compiler;
use crate::context::{Concurrency, ContextStore};
use crate::deserialize;
use crate::error::{ArgumentError, CompileError, Error, SerializeError};
use crate::options::EngineOptions;
use crate::plan::{Direction, Program};
use crate::serialize;
use crate::source::{ReaderSource, SliceSource};
use crate::write::StdWriteAdapter;

type PlanCell = Arc<OnceLock<Result<Arc<Program>, CompileError>>>;

struct Shared {
    options: EngineOptions,
    plans: Mutex<HashMap<(TypeId, Direction), PlanCell>>,
}

/// Compiles and caches plans, and hands out serializers and deserializers
/// built from them.
///
/// Each shape is compiled at most once per direction, even when several
/// threads ask for it at the same time; a shape that fails to compile keeps
/// failing with the same error. Cloning an engine shares its cache.
#[derive(Clone)]
pub struct Engine {
    shared: Arc<Shared>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// An engine with default options.
    pub fn new() -> Self {
        Self::build(EngineOptions::default())
    }

    /// An engine with the given options, once they pass validation.
    pub fn with_options(options: EngineOptions) -> Result<Self, ArgumentError> {
        options.validate()?;
        Ok(Self::build(options))
    }

    fn build(options: EngineOptions) -> Self {
        Self {
            shared: Arc::new(Shared {
                options,
                plans: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The options plans are compiled with.
    pub fn options(&self) -> &EngineOptions {
        &self.shared.options
    }

    /// The plan for `shape`, compiling it on first request.
    pub fn program(
        &self,
        shape: &'static Shape,
        direction: Direction,
    ) -> Result<Arc<Program>, CompileError> {
        let cell = self
            .shared
            .plans
            .lock()
            .entry((shape.id.get(), direction))
            .or_default()
            .clone();

        let mut compiled = false;
        let result = cell.get_or_init(|| {
            compiled = true;
            debug!(shape = shape.type_name(), %direction, "plan cache miss");
            compiler::compile(shape, direction, &*self.shared.options.naming).map(Arc::new)
        });
        if !compiled {
            trace!(shape = shape.type_name(), %direction, "plan cache hit");
        }
        result.clone()
    }

    /// A serializer for `T`. Fails if `T` has no serialization plan.
    pub fn serializer<T: Shaped>(&self, mode: Concurrency) -> Result<Serializer<T>, Error> {
        Ok(Serializer {
            program: self.program(T::SHAPE, Direction::Serialize)?,
            contexts: ContextStore::new(mode, self.shared.options.pool_capacity),
            engine: self.clone(),
            _marker: PhantomData,
        })
    }

    /// A deserializer for `T`. Fails if `T` has no deserialization plan.
    pub fn deserializer<T: Shaped>(&self, mode: Concurrency) -> Result<Deserializer<T>, Error> {
        Ok(Deserializer {
            program: self.program(T::SHAPE, Direction::Deserialize)?,
            contexts: ContextStore::new(mode, self.shared.options.pool_capacity),
            max_depth: self.shared.options.max_depth,
            _marker: PhantomData,
        })
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.shared.options)
            .field("plans", &self.shared.plans.lock().len())
            .finish()
    }
}

/// Writes values of `T` as JSON.
pub struct Serializer<T> {
    engine: Engine,
    program: Arc<Program>,
    contexts: ContextStore,
    _marker: PhantomData<fn(&T)>,
}

impl<T: Shaped> Serializer<T> {
    /// How calls obtain their context.
    pub fn concurrency(&self) -> Concurrency {
        self.contexts.mode()
    }

    /// The compiled plan.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Serialize to a new string.
    pub fn serialize(&self, value: &T) -> Result<String, Error> {
        let mut out = Vec::new();
        self.serialize_into(value, &mut out)?;
        String::from_utf8(out).map_err(|_| {
            SerializeError::InvalidValue {
                type_name: self.program.shape().type_name(),
                reason: "output is not valid UTF-8",
            }
            .into()
        })
    }

    /// Append the serialization to `out`. On error `out` is left as it was.
    pub fn serialize_into(&self, value: &T, out: &mut Vec<u8>) -> Result<(), Error> {
        let max_depth = self.engine.options().max_depth;
        self.contexts.with(|ctx| {
            let start = out.len();
            out.reserve(ctx.output_hint);
            let result = serialize::run(
                &self.engine,
                &self.program,
                value as &dyn Any,
                out,
                &mut ctx.guard,
                max_depth,
            );
            match result {
                Ok(()) => ctx.output_hint = out.len() - start,
                Err(_) => out.truncate(start),
            }
            result
        })
    }

    /// Serialize into a writer. The writer is buffered internally and
    /// flushed before returning.
    pub fn serialize_to_writer<W: io::Write>(&self, value: &T, writer: W) -> Result<(), Error> {
        let max_depth = self.engine.options().max_depth;
        let mut adapter = StdWriteAdapter::new(BufWriter::new(writer));
        self.contexts.with(|ctx| {
            serialize::run(
                &self.engine,
                &self.program,
                value as &dyn Any,
                &mut adapter,
                &mut ctx.guard,
                max_depth,
            )
        })?;
        adapter
            .into_result()
            .map_err(|e| SerializeError::Io(e).into())
    }
}

impl<T> fmt::Debug for Serializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer")
            .field("program", &self.program)
            .field("concurrency", &self.contexts.mode())
            .finish()
    }
}

/// Reads values of `T` from JSON.
pub struct Deserializer<T> {
    program: Arc<Program>,
    contexts: ContextStore,
    max_depth: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Shaped> Deserializer<T> {
    /// How calls obtain their context.
    pub fn concurrency(&self) -> Concurrency {
        self.contexts.mode()
    }

    /// The compiled plan.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Deserialize from text.
    pub fn deserialize(&self, text: &str) -> Result<T, Error> {
        self.deserialize_slice(text.as_bytes())
    }

    /// Deserialize from bytes; strings in the input must be valid UTF-8.
    pub fn deserialize_slice(&self, bytes: &[u8]) -> Result<T, Error> {
        let value = self.contexts.with(|ctx| {
            deserialize::run(
                &self.program,
                &mut SliceSource::new(bytes),
                &mut ctx.scratch,
                self.max_depth,
            )
        })?;
        Ok(unbox::<T>(value)?)
    }

    /// Deserialize from a reader, pulling input a chunk at a time. Input
    /// after the value must be whitespace up to the end of the stream.
    pub fn deserialize_reader<R: io::Read>(&self, reader: R) -> Result<T, Error> {
        let value = self.contexts.with(|ctx| {
            deserialize::run(
                &self.program,
                &mut ReaderSource::new(reader),
                &mut ctx.scratch,
                self.max_depth,
            )
        })?;
        Ok(unbox::<T>(value)?)
    }
}

impl<T> fmt::Debug for Deserializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deserializer")
            .field("program", &self.program)
            .field("concurrency", &self.contexts.mode())
            .finish()
    }
}
