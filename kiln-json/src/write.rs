//! Token-level emitters.

use alloc::vec::Vec;

use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike, Utc};
use rust_decimal::Decimal;

use crate::error::SerializeError;

/// A sink for JSON output.
pub trait JsonWrite {
    /// Append bytes.
    fn write(&mut self, buf: &[u8]);

    /// Hint that about `additional` more bytes are coming.
    fn reserve(&mut self, additional: usize);
}

impl JsonWrite for Vec<u8> {
    #[inline]
    fn write(&mut self, buf: &[u8]) {
        self.extend_from_slice(buf);
    }

    #[inline]
    fn reserve(&mut self, additional: usize) {
        Vec::reserve(self, additional);
    }
}

impl<W: JsonWrite + ?Sized> JsonWrite for &mut W {
    #[inline]
    fn write(&mut self, buf: &[u8]) {
        (**self).write(buf);
    }

    #[inline]
    fn reserve(&mut self, additional: usize) {
        (**self).reserve(additional);
    }
}

/// Feeds a `std::io::Write` from the emitters.
///
/// The first I/O error is kept and every later write is dropped.
pub(crate) struct StdWriteAdapter<W> {
    writer: W,
    error: Option<std::io::Error>,
}

impl<W: std::io::Write> StdWriteAdapter<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self {
            writer,
            error: None,
        }
    }

    pub(crate) fn into_result(mut self) -> std::io::Result<()> {
        match self.error {
            Some(e) => Err(e),
            None => self.writer.flush(),
        }
    }
}

impl<W: std::io::Write> JsonWrite for StdWriteAdapter<W> {
    fn write(&mut self, buf: &[u8]) {
        if self.error.is_none()
            && let Err(e) = self.writer.write_all(buf)
        {
            self.error = Some(e);
        }
    }

    fn reserve(&mut self, _additional: usize) {}
}

/// `null`
#[inline]
pub fn write_null<W: JsonWrite>(out: &mut W) {
    out.write(b"null");
}

/// `true` or `false`
#[inline]
pub fn write_bool<W: JsonWrite>(out: &mut W, value: bool) {
    out.write(if value { b"true" } else { b"false" });
}

/// Any integer, in plain decimal.
#[inline]
pub fn write_integer<W: JsonWrite, I: itoa::Integer>(out: &mut W, value: I) {
    let mut buf = itoa::Buffer::new();
    out.write(buf.format(value).as_bytes());
}

// Integral floats below this magnitude are written without a fraction.
const EXACT_INTEGER_LIMIT: f64 = 9_007_199_254_740_992.0;

/// A double in its shortest round-tripping form; `21.0` is written as `21`.
pub fn write_f64<W: JsonWrite>(out: &mut W, value: f64) -> Result<(), SerializeError> {
    if !value.is_finite() {
        return Err(SerializeError::NonFiniteFloat { value });
    }
    if value.fract() == 0.0 && value.abs() < EXACT_INTEGER_LIMIT && !is_negative_zero(value) {
        write_integer(out, value as i64);
    } else {
        let mut buf = ryu::Buffer::new();
        out.write(buf.format_finite(value).as_bytes());
    }
    Ok(())
}

/// A float in its shortest round-tripping form.
pub fn write_f32<W: JsonWrite>(out: &mut W, value: f32) -> Result<(), SerializeError> {
    if !value.is_finite() {
        return Err(SerializeError::NonFiniteFloat {
            value: f64::from(value),
        });
    }
    if value.fract() == 0.0 && value.abs() < 16_777_216.0 && !is_negative_zero(f64::from(value)) {
        write_integer(out, value as i32);
    } else {
        let mut buf = ryu::Buffer::new();
        out.write(buf.format_finite(value).as_bytes());
    }
    Ok(())
}

#[inline]
fn is_negative_zero(value: f64) -> bool {
    value == 0.0 && value.is_sign_negative()
}

/// A decimal, keeping its scale (`1.50` stays `1.50`).
pub fn write_decimal<W: JsonWrite>(out: &mut W, value: &Decimal) -> Result<(), SerializeError> {
    let mut buf = [0u8; 64];
    let mut cursor = Cursor {
        buf: &mut buf,
        len: 0,
    };
    core::fmt::write(&mut cursor, format_args!("{value}")).map_err(|_| {
        SerializeError::InvalidValue {
            type_name: core::any::type_name::<Decimal>(),
            reason: "decimal text does not fit the buffer",
        }
    })?;
    let len = cursor.len;
    out.write(&buf[..len]);
    Ok(())
}

struct Cursor<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl core::fmt::Write for Cursor<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let end = self.len + s.len();
        let dst = self.buf.get_mut(self.len..end).ok_or(core::fmt::Error)?;
        dst.copy_from_slice(s.as_bytes());
        self.len = end;
        Ok(())
    }
}

/// A quoted, escaped string.
///
/// Only `"`, `\` and control characters are escaped; everything else,
/// including non-ASCII text, is written as is.
pub fn write_str<W: JsonWrite>(out: &mut W, s: &str) {
    out.reserve(s.len() + 2);
    out.write(b"\"");
    write_escaped(out, s);
    out.write(b"\"");
}

/// What follows the backslash for each byte: `0` writes the byte as is and
/// `u` means a `\u00XX` escape.
static ESCAPES: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut b = 0;
    while b < 0x20 {
        table[b] = b'u';
        b += 1;
    }
    table[b'\n' as usize] = b'n';
    table[b'\r' as usize] = b'r';
    table[b'\t' as usize] = b't';
    table[0x08] = b'b';
    table[0x0c] = b'f';
    table[b'"' as usize] = b'"';
    table[b'\\' as usize] = b'\\';
    table
};

/// The escaped content of a string, without quotes.
pub fn write_escaped<W: JsonWrite>(out: &mut W, s: &str) {
    let mut rest = s.as_bytes();
    // runs of plain bytes go out in one write
    while let Some(at) = rest.iter().position(|&b| ESCAPES[usize::from(b)] != 0) {
        out.write(&rest[..at]);
        let b = rest[at];
        match ESCAPES[usize::from(b)] {
            b'u' => out.write(&unicode_escape(b)),
            letter => out.write(&[b'\\', letter]),
        }
        rest = &rest[at + 1..];
    }
    out.write(rest);
}

fn unicode_escape(b: u8) -> [u8; 6] {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    [
        b'\\',
        b'u',
        b'0',
        b'0',
        HEX[usize::from(b >> 4)],
        HEX[usize::from(b & 0xf)],
    ]
}

/// A single character as a one-character string.
pub fn write_char<W: JsonWrite>(out: &mut W, c: char) {
    let mut buf = [0u8; 4];
    write_str(out, c.encode_utf8(&mut buf));
}

fn push_padded(buf: &mut Vec<u8>, value: u32, width: usize) {
    let mut digits = itoa::Buffer::new();
    let text = digits.format(value);
    buf.extend(core::iter::repeat_n(b'0', width.saturating_sub(text.len())));
    buf.extend_from_slice(text.as_bytes());
}

fn write_datetime_parts<W: JsonWrite, Tz: TimeZone>(
    out: &mut W,
    value: &DateTime<Tz>,
    offset_secs: Option<i32>,
    type_name: &'static str,
) -> Result<(), SerializeError> {
    let invalid = |reason| SerializeError::InvalidValue { type_name, reason };
    let year = u32::try_from(value.year())
        .ok()
        .filter(|&y| y <= 9999)
        .ok_or_else(|| invalid("year outside 0000..=9999"))?;
    let nanos = value.nanosecond();
    if nanos >= 1_000_000_000 {
        return Err(invalid("leap seconds cannot be written"));
    }

    let mut buf = Vec::with_capacity(40);
    buf.push(b'"');
    push_padded(&mut buf, year, 4);
    buf.push(b'-');
    push_padded(&mut buf, value.month(), 2);
    buf.push(b'-');
    push_padded(&mut buf, value.day(), 2);
    buf.push(b'T');
    push_padded(&mut buf, value.hour(), 2);
    buf.push(b':');
    push_padded(&mut buf, value.minute(), 2);
    buf.push(b':');
    push_padded(&mut buf, value.second(), 2);
    if nanos != 0 {
        let mut fraction = nanos;
        let mut width = 9;
        while fraction % 10 == 0 {
            fraction /= 10;
            width -= 1;
        }
        buf.push(b'.');
        push_padded(&mut buf, fraction, width);
    }
    match offset_secs {
        None => buf.push(b'Z'),
        Some(secs) => {
            if secs % 60 != 0 {
                return Err(invalid("offsets with seconds cannot be written"));
            }
            buf.push(if secs < 0 { b'-' } else { b'+' });
            let minutes = secs.unsigned_abs() / 60;
            push_padded(&mut buf, minutes / 60, 2);
            buf.push(b':');
            push_padded(&mut buf, minutes % 60, 2);
        }
    }
    buf.push(b'"');
    out.write(&buf);
    Ok(())
}

/// A UTC date-time, ending in `Z`.
pub fn write_datetime<W: JsonWrite>(
    out: &mut W,
    value: &DateTime<Utc>,
) -> Result<(), SerializeError> {
    write_datetime_parts(out, value, None, "DateTime<Utc>")
}

/// A date-time with its numeric offset (`+00:00` for UTC).
pub fn write_datetime_offset<W: JsonWrite>(
    out: &mut W,
    value: &DateTime<FixedOffset>,
) -> Result<(), SerializeError> {
    write_datetime_parts(
        out,
        value,
        Some(value.offset().local_minus_utc()),
        "DateTime<FixedOffset>",
    )
}
