//! Runs a serialization [`Program`] into a [`JsonWrite`] sink.

use alloc::sync::Arc;
use core::any::Any;

use chrono::{DateTime, FixedOffset, Utc};
use kiln_shape::{Dynamic, ScalarKind, downcast};
use rust_decimal::Decimal;

use crate::engine::Engine;
use crate::error::{Error, SerializeError};
use crate::guard::CycleGuard;
use crate::plan::{Direction, Node, NodeId, Program};
use crate::write::{self, JsonWrite};

/// Write `value`, which must be of the program's shape.
pub(crate) fn run<W: JsonWrite>(
    engine: &Engine,
    program: &Program,
    value: &dyn Any,
    out: &mut W,
    guard: &mut CycleGuard,
    max_depth: usize,
) -> Result<(), Error> {
    let mut emitter = Emitter {
        engine,
        out,
        guard,
        max_depth,
    };
    emitter.value(program, program.root, value, 0)
}

struct Emitter<'a, W> {
    engine: &'a Engine,
    out: &'a mut W,
    guard: &'a mut CycleGuard,
    max_depth: usize,
}

impl<W: JsonWrite> Emitter<'_, W> {
    fn check_depth(&self, depth: usize) -> Result<(), SerializeError> {
        if depth >= self.max_depth {
            return Err(SerializeError::DepthLimitExceeded {
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    fn separator(&mut self, index: usize) {
        if index > 0 {
            self.out.write(b",");
        }
    }

    fn value(
        &mut self,
        program: &Program,
        id: NodeId,
        value: &dyn Any,
        depth: usize,
    ) -> Result<(), Error> {
        match program.node(id) {
            Node::Scalar(kind) => self.scalar(*kind, value),
            Node::Nullable { vtable, inner } => match (vtable.get)(value)? {
                Some(inner_value) => self.value(program, *inner, inner_value, depth),
                None => {
                    write::write_null(self.out);
                    Ok(())
                }
            },
            Node::Pointer {
                vtable,
                inner,
                guarded,
            } => {
                let pointee = (vtable.borrow)(value)?;
                match guarded {
                    Some(type_name) => {
                        let address = (vtable.address)(value)?;
                        self.guard.enter(address, type_name)?;
                        let result = self.value(program, *inner, pointee, depth);
                        self.guard.leave(address);
                        result
                    }
                    None => self.value(program, *inner, pointee, depth),
                }
            }
            Node::Sequence { vtable, item } => {
                self.check_depth(depth)?;
                self.out.write(b"[");
                let len = (vtable.len)(value)?;
                for index in 0..len {
                    let Some(element) = (vtable.get)(value, index)? else {
                        break;
                    };
                    self.separator(index);
                    self.value(program, *item, element, depth + 1)?;
                }
                self.out.write(b"]");
                Ok(())
            }
            Node::Map {
                vtable,
                value: value_node,
            } => {
                self.check_depth(depth)?;
                self.out.write(b"{");
                for (index, (key, entry)) in (vtable.iter)(value)?.enumerate() {
                    self.separator(index);
                    write::write_str(self.out, downcast::<alloc::string::String>(key)?);
                    self.out.write(b":");
                    self.value(program, *value_node, entry, depth + 1)?;
                }
                self.out.write(b"}");
                Ok(())
            }
            Node::WriteRecord(record) => {
                self.check_depth(depth)?;
                self.out.write(b"{");
                for (index, field) in record.fields.iter().enumerate() {
                    self.separator(index);
                    self.out.write(&field.key);
                    let member = (field.get)(value)?;
                    self.value(program, field.node, member, depth + 1)?;
                }
                self.out.write(b"}");
                Ok(())
            }
            Node::Dynamic => self.dynamic(downcast::<Dynamic>(value)?, depth),
            Node::ReadRecord(_) | Node::Placeholder => {
                unreachable!("serialization programs hold no read nodes")
            }
        }
    }

    fn scalar(&mut self, kind: ScalarKind, value: &dyn Any) -> Result<(), Error> {
        let out = &mut *self.out;
        match kind {
            ScalarKind::Bool => write::write_bool(out, *downcast::<bool>(value)?),
            ScalarKind::I8 => write::write_integer(out, *downcast::<i8>(value)?),
            ScalarKind::I16 => write::write_integer(out, *downcast::<i16>(value)?),
            ScalarKind::I32 => write::write_integer(out, *downcast::<i32>(value)?),
            ScalarKind::I64 => write::write_integer(out, *downcast::<i64>(value)?),
            ScalarKind::I128 => write::write_integer(out, *downcast::<i128>(value)?),
            ScalarKind::Isize => write::write_integer(out, *downcast::<isize>(value)?),
            ScalarKind::U8 => write::write_integer(out, *downcast::<u8>(value)?),
            ScalarKind::U16 => write::write_integer(out, *downcast::<u16>(value)?),
            ScalarKind::U32 => write::write_integer(out, *downcast::<u32>(value)?),
            ScalarKind::U64 => write::write_integer(out, *downcast::<u64>(value)?),
            ScalarKind::U128 => write::write_integer(out, *downcast::<u128>(value)?),
            ScalarKind::Usize => write::write_integer(out, *downcast::<usize>(value)?),
            ScalarKind::F32 => write::write_f32(out, *downcast::<f32>(value)?)?,
            ScalarKind::F64 => write::write_f64(out, *downcast::<f64>(value)?)?,
            ScalarKind::Decimal => {
                write::write_decimal(out, downcast::<Decimal>(value)?)?;
            }
            ScalarKind::Char => write::write_char(out, *downcast::<char>(value)?),
            ScalarKind::String => {
                write::write_str(out, downcast::<alloc::string::String>(value)?);
            }
            ScalarKind::DateTime => {
                write::write_datetime(out, downcast::<DateTime<Utc>>(value)?)?;
            }
            ScalarKind::DateTimeOffset => {
                write::write_datetime_offset(out, downcast::<DateTime<FixedOffset>>(value)?)?;
            }
        }
        Ok(())
    }

    fn dynamic(&mut self, value: &Dynamic, depth: usize) -> Result<(), Error> {
        match value {
            Dynamic::Null => write::write_null(self.out),
            Dynamic::Bool(b) => write::write_bool(self.out, *b),
            Dynamic::Number(n) => write::write_f64(self.out, *n)?,
            Dynamic::String(s) => write::write_str(self.out, s),
            Dynamic::Array(items) => {
                self.check_depth(depth)?;
                self.out.write(b"[");
                for (index, item) in items.iter().enumerate() {
                    self.separator(index);
                    self.dynamic(item, depth + 1)?;
                }
                self.out.write(b"]");
            }
            Dynamic::Object(map) => {
                self.check_depth(depth)?;
                self.out.write(b"{");
                for (index, (key, item)) in map.iter().enumerate() {
                    self.separator(index);
                    write::write_str(self.out, key);
                    self.out.write(b":");
                    self.dynamic(item, depth + 1)?;
                }
                self.out.write(b"}");
            }
            Dynamic::Typed(inner) => {
                let shape = inner.shape();
                trace!(shape = shape.type_name(), "resolving plan for typed value");
                let program = self
                    .engine
                    .program(shape, Direction::Serialize)
                    .map_err(|source| SerializeError::UnsupportedType {
                        type_name: shape.type_name(),
                        source,
                    })?;
                // the allocation is shared, whatever it holds
                let address = Arc::as_ptr(inner) as *const () as usize;
                self.guard.enter(address, shape.type_name())?;
                let result = self.value(&program, program.root, inner.as_any(), depth);
                self.guard.leave(address);
                result?;
            }
        }
        Ok(())
    }
}
