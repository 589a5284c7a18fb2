//! Runs a deserialization [`Program`] over a [`Source`].

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use indexmap::IndexMap;
use kiln_shape::{Dynamic, ScalarKind};

use crate::error::{Error, JsonError, JsonErrorKind, Span};
use crate::plan::{Node, NodeId, Program, ReadRecord};
use crate::read::{self, after_comma, depth_exceeded, expect, skip_whitespace, unexpected};
use crate::source::Source;

/// Parse one complete document; only whitespace may follow the value.
pub(crate) fn run<S: Source>(
    program: &Program,
    src: &mut S,
    scratch: &mut Vec<u8>,
    max_depth: usize,
) -> Result<Box<dyn Any>, Error> {
    let mut reader = Reader {
        program,
        scratch,
        max_depth,
    };
    let value = reader.value(src, program.root, 0)?;
    if skip_whitespace(src)?.is_some() {
        return Err(JsonError::new(
            JsonErrorKind::TrailingCharacters,
            Span::at(src.position()),
        )
        .into());
    }
    Ok(value)
}

struct Reader<'a> {
    program: &'a Program,
    scratch: &'a mut Vec<u8>,
    max_depth: usize,
}

impl<'a> Reader<'a> {
    fn check_depth<S: Source>(&self, src: &S, depth: usize) -> Result<(), JsonError> {
        if depth >= self.max_depth {
            return Err(depth_exceeded(src.position(), self.max_depth));
        }
        Ok(())
    }

    fn value<S: Source>(
        &mut self,
        src: &mut S,
        id: NodeId,
        depth: usize,
    ) -> Result<Box<dyn Any>, Error> {
        let program = self.program;
        let next = skip_whitespace(src)?;
        match program.node(id) {
            Node::Scalar(kind) => Ok(self.scalar(src, *kind)?),
            Node::Nullable { vtable, inner } => {
                if next == Some(b'n') {
                    read::read_null(src)?;
                    Ok((vtable.none)())
                } else {
                    let value = self.value(src, *inner, depth)?;
                    Ok((vtable.some)(value)?)
                }
            }
            Node::Pointer { vtable, inner, .. } => {
                let value = self.value(src, *inner, depth)?;
                Ok((vtable.new)(value)?)
            }
            Node::Sequence { vtable, item } => {
                self.check_depth(src, depth)?;
                let mut items = Vec::new();
                self.elements(src, |this, src| {
                    items.push(this.value(src, *item, depth + 1)?);
                    Ok(())
                })?;
                Ok((vtable.collect)(items)?)
            }
            Node::Map { vtable, value } => {
                self.check_depth(src, depth)?;
                let mut entries: Vec<(Box<dyn Any>, Box<dyn Any>)> = Vec::new();
                self.members(src, |this, src| {
                    let key = read::read_string(src, this.scratch)?;
                    colon(src)?;
                    let item = this.value(src, *value, depth + 1)?;
                    entries.push((Box::new(key), item));
                    Ok(())
                })?;
                Ok((vtable.collect)(entries)?)
            }
            Node::ReadRecord(record) => self.record(src, record, depth),
            Node::Dynamic => Ok(Box::new(self.dynamic(src, depth)?)),
            Node::WriteRecord(_) | Node::Placeholder => {
                unreachable!("deserialization programs hold no write nodes")
            }
        }
    }

    fn record<S: Source>(
        &mut self,
        src: &mut S,
        record: &ReadRecord,
        depth: usize,
    ) -> Result<Box<dyn Any>, Error> {
        self.check_depth(src, depth)?;
        let mut target = (record.construct)();
        self.members(src, |this, src| {
            expect(src, b'"', "a member name")?;
            match src.match_key(&record.keys)? {
                Some(slot) => {
                    let field = &record.fields[slot];
                    colon(src)?;
                    let value = this.value(src, field.node, depth + 1)?;
                    (field.set)(&mut *target, value)?;
                }
                None => {
                    trace!(record = record.type_name, "skipping unknown member");
                    colon(src)?;
                    read::skip_value(src, this.scratch, depth + 1, this.max_depth)?;
                }
            }
            Ok(())
        })?;
        Ok(target)
    }

    /// `[` value (`,` value)* `]`, with `each` reading one value.
    fn elements<S: Source>(
        &mut self,
        src: &mut S,
        mut each: impl FnMut(&mut Self, &mut S) -> Result<(), Error>,
    ) -> Result<(), Error> {
        expect(src, b'[', "an array")?;
        if skip_whitespace(src)? == Some(b']') {
            src.bump();
            return Ok(());
        }
        loop {
            each(self, src)?;
            let next = skip_whitespace(src)?;
            let pos = src.position();
            match next {
                Some(b',') => {
                    src.bump();
                    after_comma(src, b']')?;
                }
                Some(b']') => {
                    src.bump();
                    return Ok(());
                }
                other => return Err(unexpected(other, pos, "`,` or `]`").into()),
            }
        }
    }

    /// `{` member (`,` member)* `}`; `each` starts at the member's opening
    /// quote and reads through its value.
    fn members<S: Source>(
        &mut self,
        src: &mut S,
        mut each: impl FnMut(&mut Self, &mut S) -> Result<(), Error>,
    ) -> Result<(), Error> {
        expect(src, b'{', "an object")?;
        if skip_whitespace(src)? == Some(b'}') {
            src.bump();
            return Ok(());
        }
        loop {
            skip_whitespace(src)?;
            each(self, src)?;
            let next = skip_whitespace(src)?;
            let pos = src.position();
            match next {
                Some(b',') => {
                    src.bump();
                    after_comma(src, b'}')?;
                }
                Some(b'}') => {
                    src.bump();
                    return Ok(());
                }
                other => return Err(unexpected(other, pos, "`,` or `}`").into()),
            }
        }
    }

    fn scalar<S: Source>(&mut self, src: &mut S, kind: ScalarKind) -> Result<Box<dyn Any>, JsonError> {
        let scratch = &mut *self.scratch;
        Ok(match kind {
            ScalarKind::Bool => Box::new(read::read_bool(src)?),
            ScalarKind::I8 => Box::new(read::read_integer::<i8, _>(src, scratch, "i8")?),
            ScalarKind::I16 => Box::new(read::read_integer::<i16, _>(src, scratch, "i16")?),
            ScalarKind::I32 => Box::new(read::read_integer::<i32, _>(src, scratch, "i32")?),
            ScalarKind::I64 => Box::new(read::read_integer::<i64, _>(src, scratch, "i64")?),
            ScalarKind::I128 => Box::new(read::read_integer::<i128, _>(src, scratch, "i128")?),
            ScalarKind::Isize => Box::new(read::read_integer::<isize, _>(src, scratch, "isize")?),
            ScalarKind::U8 => Box::new(read::read_integer::<u8, _>(src, scratch, "u8")?),
            ScalarKind::U16 => Box::new(read::read_integer::<u16, _>(src, scratch, "u16")?),
            ScalarKind::U32 => Box::new(read::read_integer::<u32, _>(src, scratch, "u32")?),
            ScalarKind::U64 => Box::new(read::read_integer::<u64, _>(src, scratch, "u64")?),
            ScalarKind::U128 => Box::new(read::read_integer::<u128, _>(src, scratch, "u128")?),
            ScalarKind::Usize => Box::new(read::read_integer::<usize, _>(src, scratch, "usize")?),
            ScalarKind::F32 => Box::new(read::read_f32(src, scratch)?),
            ScalarKind::F64 => Box::new(read::read_f64(src, scratch)?),
            ScalarKind::Decimal => Box::new(read::read_decimal(src, scratch)?),
            ScalarKind::Char => Box::new(read::read_char(src, scratch)?),
            ScalarKind::String => Box::new(read::read_string(src, scratch)?),
            ScalarKind::DateTime => Box::new(read::read_datetime(src, scratch)?),
            ScalarKind::DateTimeOffset => Box::new(read::read_datetime_offset(src, scratch)?),
        })
    }

    /// Any value, typed by its leading byte.
    fn dynamic<S: Source>(&mut self, src: &mut S, depth: usize) -> Result<Dynamic, Error> {
        let next = skip_whitespace(src)?;
        let pos = src.position();
        Ok(match next {
            Some(b'n') => {
                read::read_null(src)?;
                Dynamic::Null
            }
            Some(b't' | b'f') => Dynamic::Bool(read::read_bool(src)?),
            Some(b'-' | b'0'..=b'9') => Dynamic::Number(read::read_f64(src, self.scratch)?),
            Some(b'"') => Dynamic::String(read::read_string(src, self.scratch)?),
            Some(b'[') => {
                self.check_depth(src, depth)?;
                let mut items = Vec::new();
                self.elements(src, |this, src| {
                    items.push(this.dynamic(src, depth + 1)?);
                    Ok(())
                })?;
                Dynamic::Array(items)
            }
            Some(b'{') => {
                self.check_depth(src, depth)?;
                let mut map: IndexMap<String, Dynamic> = IndexMap::new();
                self.members(src, |this, src| {
                    let key = read::read_string(src, this.scratch)?;
                    colon(src)?;
                    let value = this.dynamic(src, depth + 1)?;
                    map.insert(key, value);
                    Ok(())
                })?;
                Dynamic::Object(map)
            }
            other => return Err(unexpected(other, pos, "a value").into()),
        })
    }
}

fn colon<S: Source>(src: &mut S) -> Result<(), JsonError> {
    skip_whitespace(src)?;
    expect(src, b':', "`:`")
}
