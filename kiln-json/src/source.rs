//! Where parsers pull their bytes from.
//!
//! Every parser is generic over [`Source`]: the same code runs over an
//! in-memory buffer ([`SliceSource`]) and over a blocking reader
//! ([`ReaderSource`]). Sources only ever hand out one byte of lookahead; the
//! slice source additionally answers bulk questions (plain runs, literal
//! prefixes) without going byte by byte.

use alloc::boxed::Box;
use alloc::string::ToString;
use alloc::vec::Vec;
use std::io::{ErrorKind, Read};

use crate::chars::is_control;
use crate::error::{JsonError, JsonErrorKind, Span};
use crate::read;
use crate::trie::CompiledTrie;

/// A pull-style byte source with single-byte lookahead.
pub trait Source {
    /// Offset of the next unread byte from the start of the input.
    fn position(&self) -> usize;

    /// The next byte without consuming it, or `None` at the end of input.
    fn peek(&mut self) -> Result<Option<u8>, JsonError>;

    /// Consume the byte returned by the last [`Source::peek`].
    fn bump(&mut self);

    /// Consume and return the next byte.
    #[inline]
    fn next_byte(&mut self) -> Result<Option<u8>, JsonError> {
        let b = self.peek()?;
        if b.is_some() {
            self.bump();
        }
        Ok(b)
    }

    /// Append bytes to `out` up to (not including) the next `"`, `\` or
    /// control character, or the end of input.
    fn copy_plain_run(&mut self, out: &mut Vec<u8>) -> Result<(), JsonError> {
        while let Some(b) = self.peek()? {
            if is_special(b) {
                break;
            }
            out.push(b);
            self.bump();
        }
        Ok(())
    }

    /// Like [`Source::copy_plain_run`], discarding the bytes.
    fn skip_plain_run(&mut self) -> Result<(), JsonError> {
        while let Some(b) = self.peek()? {
            if is_special(b) {
                break;
            }
            self.bump();
        }
        Ok(())
    }

    /// Consume string content that decodes to exactly `literal`.
    ///
    /// Returns `false` and consumes nothing if the content does not start
    /// with it, or if the source cannot look that far ahead. Callers then
    /// fall back to [`Source::next_byte`].
    fn eat_literal(&mut self, literal: &[u8]) -> Result<bool, JsonError>;

    /// Match a member name against `trie`; the opening quote has been consumed.
    fn match_key<P: Copy>(&mut self, trie: &CompiledTrie<P>) -> Result<Option<P>, JsonError>
    where
        Self: Sized,
    {
        trie.match_source(self)
    }
}

#[inline]
const fn is_special(b: u8) -> bool {
    b == b'"' || b == b'\\' || is_control(b)
}

/// A source over an in-memory buffer.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    /// Start reading at the beginning of `buf`.
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Start reading at `pos`.
    pub const fn at(buf: &'a [u8], pos: usize) -> Self {
        Self { buf, pos }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        self.buf.get(self.pos..).unwrap_or_default()
    }

    fn plain_len(&self) -> usize {
        self.remaining()
            .iter()
            .position(|&b| is_special(b))
            .unwrap_or(self.remaining().len())
    }
}

impl Source for SliceSource<'_> {
    #[inline]
    fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    fn peek(&mut self) -> Result<Option<u8>, JsonError> {
        Ok(self.buf.get(self.pos).copied())
    }

    #[inline]
    fn bump(&mut self) {
        self.pos += 1;
    }

    fn copy_plain_run(&mut self, out: &mut Vec<u8>) -> Result<(), JsonError> {
        let len = self.plain_len();
        out.extend_from_slice(&self.remaining()[..len]);
        self.pos += len;
        Ok(())
    }

    fn skip_plain_run(&mut self) -> Result<(), JsonError> {
        self.pos += self.plain_len();
        Ok(())
    }

    fn eat_literal(&mut self, literal: &[u8]) -> Result<bool, JsonError> {
        match read::starts_with(self.buf, self.pos, literal)? {
            Some(consumed) => {
                self.pos += consumed;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn match_key<P: Copy>(&mut self, trie: &CompiledTrie<P>) -> Result<Option<P>, JsonError> {
        trie.match_slice(self.buf, &mut self.pos)
    }
}

const READ_BUFFER_SIZE: usize = 8 * 1024;

/// A source over a blocking reader, refilled a chunk at a time.
pub struct ReaderSource<R> {
    reader: R,
    buf: Box<[u8]>,
    // consumed..filled is unread
    consumed: usize,
    filled: usize,
    // input offset of buf[0]
    base: usize,
    eof: bool,
}

impl<R: Read> ReaderSource<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: alloc::vec![0; READ_BUFFER_SIZE].into_boxed_slice(),
            consumed: 0,
            filled: 0,
            base: 0,
            eof: false,
        }
    }

    /// Give back the reader. Bytes buffered but not consumed are lost.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn refill(&mut self) -> Result<(), JsonError> {
        self.base += self.filled;
        self.consumed = 0;
        self.filled = 0;
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.filled = n;
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(JsonError::new(
                        JsonErrorKind::Io(e.to_string()),
                        Span::at(self.base),
                    ));
                }
            }
        }
    }

    fn buffered(&mut self) -> Result<&[u8], JsonError> {
        if self.consumed == self.filled && !self.eof {
            self.refill()?;
        }
        Ok(&self.buf[self.consumed..self.filled])
    }
}

impl<R: Read> Source for ReaderSource<R> {
    #[inline]
    fn position(&self) -> usize {
        self.base + self.consumed
    }

    #[inline]
    fn peek(&mut self) -> Result<Option<u8>, JsonError> {
        if self.consumed < self.filled {
            return Ok(Some(self.buf[self.consumed]));
        }
        if self.eof {
            return Ok(None);
        }
        self.refill()?;
        Ok(self.buf[..self.filled].first().copied())
    }

    #[inline]
    fn bump(&mut self) {
        self.consumed += 1;
    }

    fn copy_plain_run(&mut self, out: &mut Vec<u8>) -> Result<(), JsonError> {
        loop {
            let chunk = self.buffered()?;
            if chunk.is_empty() {
                return Ok(());
            }
            let len = chunk.iter().position(|&b| is_special(b));
            let take = len.unwrap_or(chunk.len());
            out.extend_from_slice(&chunk[..take]);
            self.consumed += take;
            if len.is_some() {
                return Ok(());
            }
        }
    }

    fn skip_plain_run(&mut self) -> Result<(), JsonError> {
        loop {
            let chunk = self.buffered()?;
            if chunk.is_empty() {
                return Ok(());
            }
            let len = chunk.iter().position(|&b| is_special(b));
            let take = len.unwrap_or(chunk.len());
            self.consumed += take;
            if len.is_some() {
                return Ok(());
            }
        }
    }

    // Only the buffered bytes are looked at, and only unescaped content
    // matches; anything else is left to the byte-wise path.
    fn eat_literal(&mut self, literal: &[u8]) -> Result<bool, JsonError> {
        if literal.iter().any(|&b| is_special(b)) {
            return Ok(false);
        }
        let matched = self.buffered()?.starts_with(literal);
        if matched {
            self.consumed += literal.len();
        }
        Ok(matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_testhelpers::test;

    /// Hands out at most `step` bytes per read, to exercise refills.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn reader_tracks_position_across_refills() {
        let mut src = ReaderSource::new(Trickle {
            data: b"abc\"def",
            step: 2,
        });
        let mut out = Vec::new();
        src.copy_plain_run(&mut out).unwrap();
        assert_eq!(out, b"abc");
        assert_eq!(src.position(), 3);
        assert_eq!(src.next_byte().unwrap(), Some(b'"'));
        src.skip_plain_run().unwrap();
        assert_eq!(src.position(), 7);
        assert_eq!(src.peek().unwrap(), None);
    }

    #[test]
    fn slice_stops_at_specials() {
        let mut src = SliceSource::new(b"ab\\n\"");
        let mut out = Vec::new();
        src.copy_plain_run(&mut out).unwrap();
        assert_eq!(out, b"ab");
        assert_eq!(src.peek().unwrap(), Some(b'\\'));
        assert_eq!(src.remaining(), b"\\n\"");
    }

    #[test]
    fn literals_are_eaten_whole_or_not_at_all() {
        let mut src = ReaderSource::new(Trickle {
            data: b"name\"rest",
            step: 64,
        });
        assert!(!src.eat_literal(b"nail").unwrap());
        assert_eq!(src.position(), 0);
        assert!(src.eat_literal(b"name").unwrap());
        assert_eq!(src.position(), 4);
        assert!(!src.eat_literal(b"\"").unwrap());
        assert_eq!(src.next_byte().unwrap(), Some(b'"'));

        // a literal split across reads is left to the caller
        let mut src = ReaderSource::new(Trickle {
            data: b"abcdef",
            step: 3,
        });
        assert!(!src.eat_literal(b"abcd").unwrap());
        assert_eq!(src.position(), 0);
        assert!(src.eat_literal(b"abc").unwrap());
        assert!(src.eat_literal(b"def").unwrap());
        assert_eq!(src.peek().unwrap(), None);

        let mut slice = SliceSource::new(br#"n\u0061me""#);
        assert!(!slice.eat_literal(b"nope").unwrap());
        assert!(slice.eat_literal(b"name").unwrap());
        assert_eq!(slice.remaining(), b"\"");
    }

    #[test]
    fn reader_reports_io_errors() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("wire cut"))
            }
        }
        let err = ReaderSource::new(Broken).peek().unwrap_err();
        assert_eq!(err.kind, JsonErrorKind::Io("wire cut".into()));
    }
}
