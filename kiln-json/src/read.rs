//! Token-level parsers.
//!
//! Each routine starts at the current position of a [`Source`] (leading
//! whitespace is the caller's business) and leaves it just past the token.
//! Nothing trailing is consumed.

use alloc::string::String;
use alloc::vec::Vec;
use core::ops::Range;
use core::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;

use crate::chars::{hex_value, is_control, is_digit, is_whitespace};
use crate::error::{JsonError, JsonErrorKind, Span};
use crate::source::{SliceSource, Source};

pub(crate) fn unexpected(found: Option<u8>, offset: usize, expected: &'static str) -> JsonError {
    match found {
        Some(got) => JsonError::new(
            JsonErrorKind::UnexpectedChar { got, expected },
            Span::new(offset, 1),
        ),
        None => JsonError::new(JsonErrorKind::UnexpectedEof { expected }, Span::at(offset)),
    }
}

/// Skip insignificant whitespace and peek at the byte after it.
#[inline]
pub fn skip_whitespace<S: Source>(src: &mut S) -> Result<Option<u8>, JsonError> {
    loop {
        match src.peek()? {
            Some(b) if is_whitespace(b) => src.bump(),
            other => return Ok(other),
        }
    }
}

/// Consume `byte` or fail.
#[inline]
pub fn expect<S: Source>(src: &mut S, byte: u8, expected: &'static str) -> Result<(), JsonError> {
    let pos = src.position();
    match src.peek()? {
        Some(b) if b == byte => {
            src.bump();
            Ok(())
        }
        other => Err(unexpected(other, pos, expected)),
    }
}

fn read_literal<S: Source>(
    src: &mut S,
    literal: &'static [u8],
    expected: &'static str,
) -> Result<(), JsonError> {
    for &b in literal {
        let pos = src.position();
        match src.peek()? {
            Some(got) if got == b => src.bump(),
            other => return Err(unexpected(other, pos, expected)),
        }
    }
    Ok(())
}

/// `null`
pub fn read_null<S: Source>(src: &mut S) -> Result<(), JsonError> {
    read_literal(src, b"null", "`null`")
}

/// `true` or `false`
pub fn read_bool<S: Source>(src: &mut S) -> Result<bool, JsonError> {
    let pos = src.position();
    match src.peek()? {
        Some(b't') => read_literal(src, b"true", "`true`").map(|()| true),
        Some(b'f') => read_literal(src, b"false", "`false`").map(|()| false),
        other => Err(unexpected(other, pos, "a boolean")),
    }
}

/// Nullable variant of any reader: `null` gives `None`, anything else is
/// handed to `read`.
pub fn read_nullable<S: Source, T>(
    src: &mut S,
    read: impl FnOnce(&mut S) -> Result<T, JsonError>,
) -> Result<Option<T>, JsonError> {
    if src.peek()? == Some(b'n') {
        read_null(src)?;
        Ok(None)
    } else {
        read(src).map(Some)
    }
}

/// Shape of a scanned number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberToken {
    /// Offset of the first byte.
    pub start: usize,
    /// Offset of the exponent marker, if any, within the scanned text.
    pub exponent: Option<usize>,
    /// No fraction and no exponent.
    pub integer: bool,
}

fn scan_digits<S: Source>(src: &mut S, out: &mut Vec<u8>) -> Result<usize, JsonError> {
    let mut count = 0;
    while let Some(b) = src.peek()? {
        if !is_digit(b) {
            break;
        }
        out.push(b);
        src.bump();
        count += 1;
    }
    Ok(count)
}

/// Scan a number, copying its text into `out`.
///
/// Enforces the JSON grammar: optional minus, no leading zeros, at least one
/// digit after `.` and after the exponent marker.
pub fn scan_number<S: Source>(src: &mut S, out: &mut Vec<u8>) -> Result<NumberToken, JsonError> {
    out.clear();
    let start = src.position();
    let invalid =
        |src: &S, expected| JsonError::new(JsonErrorKind::InvalidNumber { expected }, Span::at(src.position()));

    if src.peek()? == Some(b'-') {
        out.push(b'-');
        src.bump();
    }
    match src.peek()? {
        Some(b'0') => {
            out.push(b'0');
            src.bump();
            if src.peek()?.is_some_and(is_digit) {
                return Err(invalid(&*src, "no leading zeros"));
            }
        }
        Some(b'1'..=b'9') => {
            scan_digits(src, out)?;
        }
        other if out.is_empty() => return Err(unexpected(other, start, "a number")),
        _ => return Err(invalid(&*src, "a digit after `-`")),
    }

    let mut integer = true;
    if src.peek()? == Some(b'.') {
        integer = false;
        out.push(b'.');
        src.bump();
        if scan_digits(src, out)? == 0 {
            return Err(invalid(&*src, "a digit after the decimal point"));
        }
    }

    let mut exponent = None;
    if let Some(marker @ (b'e' | b'E')) = src.peek()? {
        integer = false;
        exponent = Some(out.len());
        out.push(marker);
        src.bump();
        if let Some(sign @ (b'+' | b'-')) = src.peek()? {
            out.push(sign);
            src.bump();
        }
        if scan_digits(src, out)? == 0 {
            return Err(invalid(&*src, "a digit in the exponent"));
        }
    }

    Ok(NumberToken {
        start,
        exponent,
        integer,
    })
}

fn out_of_range(text: &[u8], start: usize, target_type: &'static str) -> JsonError {
    JsonError::new(
        JsonErrorKind::NumberOutOfRange {
            value: String::from_utf8_lossy(text).into_owned(),
            target_type,
        },
        Span::new(start, text.len()),
    )
}

/// An integer of any width; fractions and exponents are rejected.
pub fn read_integer<T, S>(
    src: &mut S,
    scratch: &mut Vec<u8>,
    target_type: &'static str,
) -> Result<T, JsonError>
where
    T: lexical_parse_integer::FromLexical,
    S: Source,
{
    let token = scan_number(src, scratch)?;
    if !token.integer {
        return Err(JsonError::new(
            JsonErrorKind::InvalidNumber {
                expected: "an integer",
            },
            Span::new(token.start, scratch.len()),
        ));
    }
    T::from_lexical(scratch).map_err(|_| out_of_range(scratch, token.start, target_type))
}

/// A double-precision float; values beyond `f64::MAX` are out of range.
pub fn read_f64<S: Source>(src: &mut S, scratch: &mut Vec<u8>) -> Result<f64, JsonError> {
    use lexical_parse_float::FromLexical as _;

    let token = scan_number(src, scratch)?;
    match f64::from_lexical(scratch) {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(out_of_range(scratch, token.start, "f64")),
    }
}

/// A single-precision float; values beyond `f32::MAX` are out of range.
pub fn read_f32<S: Source>(src: &mut S, scratch: &mut Vec<u8>) -> Result<f32, JsonError> {
    use lexical_parse_float::FromLexical as _;

    let token = scan_number(src, scratch)?;
    match f32::from_lexical(scratch) {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(out_of_range(scratch, token.start, "f32")),
    }
}

/// A decimal, including exponent forms. Digits beyond the 28th fractional
/// place are rounded away.
pub fn read_decimal<S: Source>(src: &mut S, scratch: &mut Vec<u8>) -> Result<Decimal, JsonError> {
    let token = scan_number(src, scratch)?;
    let split = token.exponent.unwrap_or(scratch.len());
    let parsed = core::str::from_utf8(&scratch[..split])
        .ok()
        .and_then(|mantissa| Decimal::from_str(mantissa).ok())
        .and_then(|mantissa| match token.exponent {
            Some(e) => scale_decimal(mantissa, parse_exponent(&scratch[e + 1..])),
            None => Some(mantissa),
        });
    parsed.ok_or_else(|| out_of_range(scratch, token.start, "Decimal"))
}

// Saturates; anything past i64 is far outside what a decimal can hold anyway.
fn parse_exponent(text: &[u8]) -> i64 {
    let (negative, digits) = match text.split_first() {
        Some((b'-', rest)) => (true, rest),
        Some((b'+', rest)) => (false, rest),
        _ => (false, text),
    };
    let magnitude = digits.iter().fold(0i64, |acc, &b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    if negative { -magnitude } else { magnitude }
}

fn scale_decimal(mut value: Decimal, exponent: i64) -> Option<Decimal> {
    if value.is_zero() {
        return Some(value);
    }
    if exponent >= 0 {
        // overflows within 29 steps for any non-zero value
        for _ in 0..exponent {
            value = value.checked_mul(Decimal::TEN)?;
        }
    } else {
        for _ in 0..exponent.unsigned_abs() {
            value = value.checked_div(Decimal::TEN)?;
            if value.is_zero() {
                break;
            }
        }
    }
    Some(value)
}

fn read_hex4<S: Source>(src: &mut S, start: usize) -> Result<u32, JsonError> {
    let mut value = 0u32;
    for _ in 0..4 {
        let pos = src.position();
        match src.next_byte()? {
            Some(b) => match hex_value(b) {
                Some(digit) => value = value * 16 + u32::from(digit),
                None => {
                    return Err(JsonError::new(
                        JsonErrorKind::InvalidEscape,
                        Span::new(start, pos + 1 - start),
                    ));
                }
            },
            None => return Err(unexpected(None, pos, "four hex digits")),
        }
    }
    Ok(value)
}

/// Decode one escape sequence; the backslash at `start` has been consumed.
///
/// A `\u` high surrogate must be followed directly by a `\u` low surrogate;
/// a lone low surrogate is rejected.
pub fn decode_escape<S: Source>(src: &mut S, start: usize) -> Result<char, JsonError> {
    let pos = src.position();
    let c = match src.next_byte()? {
        Some(b'"') => '"',
        Some(b'\\') => '\\',
        Some(b'/') => '/',
        Some(b'b') => '\u{08}',
        Some(b'f') => '\u{0c}',
        Some(b'n') => '\n',
        Some(b'r') => '\r',
        Some(b't') => '\t',
        Some(b'u') => return decode_unicode_escape(src, start),
        Some(_) => {
            return Err(JsonError::new(
                JsonErrorKind::InvalidEscape,
                Span::new(start, 2),
            ));
        }
        None => return Err(unexpected(None, pos, "an escape sequence")),
    };
    Ok(c)
}

fn decode_unicode_escape<S: Source>(src: &mut S, start: usize) -> Result<char, JsonError> {
    let surrogate = |src: &S| {
        JsonError::new(
            JsonErrorKind::InvalidSurrogate,
            Span::new(start, src.position() - start),
        )
    };

    let first = read_hex4(src, start)?;
    let code = match first {
        0xD800..=0xDBFF => {
            if src.peek()? != Some(b'\\') {
                return Err(surrogate(&*src));
            }
            src.bump();
            if src.peek()? != Some(b'u') {
                return Err(surrogate(&*src));
            }
            src.bump();
            let second = read_hex4(src, start)?;
            if !(0xDC00..=0xDFFF).contains(&second) {
                return Err(surrogate(&*src));
            }
            0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00)
        }
        0xDC00..=0xDFFF => return Err(surrogate(src)),
        _ => first,
    };
    char::from_u32(code).ok_or_else(|| surrogate(&*src))
}

#[inline]
pub(crate) fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

/// Decode string content into `scratch`; the opening quote has been consumed.
/// On success the closing quote has been consumed. Raw bytes are copied
/// as they are, so `scratch` may still need UTF-8 validation.
pub fn read_string_content<S: Source>(
    src: &mut S,
    scratch: &mut Vec<u8>,
) -> Result<(), JsonError> {
    scratch.clear();
    loop {
        src.copy_plain_run(scratch)?;
        let pos = src.position();
        match src.next_byte()? {
            Some(b'"') => break,
            Some(b'\\') => {
                let c = decode_escape(src, pos)?;
                push_char(scratch, c);
            }
            Some(b) => {
                return Err(JsonError::new(
                    JsonErrorKind::ControlCharacter(b),
                    Span::new(pos, 1),
                ));
            }
            None => return Err(unexpected(None, pos, "a closing quote")),
        }
    }
    Ok(())
}

/// Validate and discard string content; the opening quote has been consumed.
pub fn skip_string_content<S: Source>(src: &mut S) -> Result<(), JsonError> {
    loop {
        src.skip_plain_run()?;
        let pos = src.position();
        match src.next_byte()? {
            Some(b'"') => return Ok(()),
            Some(b'\\') => {
                decode_escape(src, pos)?;
            }
            Some(b) => {
                return Err(JsonError::new(
                    JsonErrorKind::ControlCharacter(b),
                    Span::new(pos, 1),
                ));
            }
            None => return Err(unexpected(None, pos, "a closing quote")),
        }
    }
}

/// Decode the string at the cursor and borrow it from `scratch`.
pub fn read_str<'s, S: Source>(
    src: &mut S,
    scratch: &'s mut Vec<u8>,
) -> Result<&'s str, JsonError> {
    expect(src, b'"', "a string")?;
    let start = src.position();
    read_string_content(src, scratch)?;
    core::str::from_utf8(scratch).map_err(|_| {
        JsonError::new(
            JsonErrorKind::InvalidUtf8,
            Span::new(start, src.position() - start),
        )
    })
}

/// A string literal.
pub fn read_string<S: Source>(src: &mut S, scratch: &mut Vec<u8>) -> Result<String, JsonError> {
    read_str(src, scratch).map(String::from)
}

/// A string literal holding exactly one character.
pub fn read_char<S: Source>(src: &mut S, scratch: &mut Vec<u8>) -> Result<char, JsonError> {
    let start = src.position();
    let s = read_str(src, scratch)?;
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(JsonError::new(
            JsonErrorKind::InvalidChar,
            Span::new(start, src.position() - start),
        )),
    }
}

/// Does the string content at `buf[pos..]` begin with `candidate` once
/// escapes are decoded?
///
/// Returns the number of input bytes that spell `candidate`. `None` means
/// it does not, including when the string closes first or `candidate` ends
/// inside the encoding of one escaped character. A malformed escape inside
/// the inspected prefix is an error.
pub fn starts_with(buf: &[u8], pos: usize, candidate: &[u8]) -> Result<Option<usize>, JsonError> {
    let window = buf.get(pos..pos + candidate.len());
    if window == Some(candidate) && !candidate.iter().any(|&b| special(b)) {
        return Ok(Some(candidate.len()));
    }

    let mut src = SliceSource::at(buf, pos);
    let mut matched = 0;
    while matched < candidate.len() {
        let here = src.position();
        match src.next_byte()? {
            None | Some(b'"') => return Ok(None),
            Some(b'\\') => {
                let c = decode_escape(&mut src, here)?;
                let mut tmp = [0u8; 4];
                let encoded = c.encode_utf8(&mut tmp).as_bytes();
                if candidate.get(matched..matched + encoded.len()) != Some(encoded) {
                    return Ok(None);
                }
                matched += encoded.len();
            }
            Some(b) if is_control(b) => return Ok(None),
            Some(b) => {
                if candidate[matched] != b {
                    return Ok(None);
                }
                matched += 1;
            }
        }
    }
    Ok(Some(src.position() - pos))
}

#[inline]
const fn special(b: u8) -> bool {
    b == b'"' || b == b'\\' || is_control(b)
}

fn digits(text: &[u8], range: Range<usize>) -> Option<u32> {
    text.get(range)?.iter().try_fold(0u32, |acc, &b| {
        is_digit(b).then(|| acc * 10 + u32::from(b - b'0'))
    })
}

/// Parse `YYYY-MM-DDTHH:MM:SS[.fffffffff](Z|±HH:MM)`.
///
/// `T` and `Z` may be lowercase. Leap seconds (`:60`) and out-of-range
/// components are rejected.
pub fn parse_datetime(text: &[u8]) -> Option<DateTime<FixedOffset>> {
    let at = |i: usize, expected: &[u8]| text.get(i).is_some_and(|b| expected.contains(b));

    let year = digits(text, 0..4)?;
    let month = digits(text, 5..7)?;
    let day = digits(text, 8..10)?;
    let hour = digits(text, 11..13)?;
    let minute = digits(text, 14..16)?;
    let second = digits(text, 17..19)?;
    if !(at(4, b"-") && at(7, b"-") && at(10, b"Tt") && at(13, b":") && at(16, b":")) {
        return None;
    }

    let mut i = 19;
    let mut nanos = 0;
    if at(i, b".") {
        let start = i + 1;
        let len = text.get(start..)?.iter().take_while(|&&b| is_digit(b)).count();
        if len == 0 || len > 9 {
            return None;
        }
        nanos = digits(text, start..start + len)? * 10u32.pow(9 - len as u32);
        i = start + len;
    }

    let offset_secs = match text.get(i)? {
        b'Z' | b'z' => {
            i += 1;
            0
        }
        sign @ (b'+' | b'-') => {
            let hours = digits(text, i + 1..i + 3)?;
            let minutes = digits(text, i + 4..i + 6)?;
            if !at(i + 3, b":") || hours > 23 || minutes > 59 {
                return None;
            }
            i += 6;
            let secs = (hours * 3600 + minutes * 60) as i32;
            if *sign == b'-' { -secs } else { secs }
        }
        _ => return None,
    };
    if i != text.len() {
        return None;
    }

    let date = NaiveDate::from_ymd_opt(year as i32, month, day)?;
    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?;
    let offset = FixedOffset::east_opt(offset_secs)?;
    offset
        .from_local_datetime(&NaiveDateTime::new(date, time))
        .single()
}

fn read_datetime_text<S: Source>(
    src: &mut S,
    scratch: &mut Vec<u8>,
) -> Result<DateTime<FixedOffset>, JsonError> {
    let start = src.position();
    read_str(src, scratch)?;
    parse_datetime(scratch).ok_or_else(|| {
        JsonError::new(
            JsonErrorKind::InvalidDateTime {
                value: String::from_utf8_lossy(scratch).into_owned(),
            },
            Span::new(start, src.position() - start),
        )
    })
}

/// A date-time with an explicit offset.
pub fn read_datetime_offset<S: Source>(
    src: &mut S,
    scratch: &mut Vec<u8>,
) -> Result<DateTime<FixedOffset>, JsonError> {
    read_datetime_text(src, scratch)
}

/// A date-time, converted to UTC if it carries another offset.
pub fn read_datetime<S: Source>(
    src: &mut S,
    scratch: &mut Vec<u8>,
) -> Result<DateTime<Utc>, JsonError> {
    read_datetime_text(src, scratch).map(|dt| dt.with_timezone(&Utc))
}

pub(crate) fn depth_exceeded(offset: usize, limit: usize) -> JsonError {
    JsonError::new(
        JsonErrorKind::DepthLimitExceeded { limit },
        Span::new(offset, 1),
    )
}

/// After a `,` inside a container: whitespace, then anything but `close`.
pub(crate) fn after_comma<S: Source>(src: &mut S, close: u8) -> Result<(), JsonError> {
    if skip_whitespace(src)? == Some(close) {
        return Err(JsonError::new(
            JsonErrorKind::TrailingComma,
            Span::new(src.position(), 1),
        ));
    }
    Ok(())
}

/// Skip one complete value of any kind, validating it.
///
/// `depth` is the nesting level of the value itself; containers deeper than
/// `limit` are rejected.
pub fn skip_value<S: Source>(
    src: &mut S,
    scratch: &mut Vec<u8>,
    depth: usize,
    limit: usize,
) -> Result<(), JsonError> {
    let next = skip_whitespace(src)?;
    let pos = src.position();
    match next {
        Some(open @ (b'{' | b'[')) => {
            if depth >= limit {
                return Err(depth_exceeded(pos, limit));
            }
            src.bump();
            let (close, expected) = if open == b'{' {
                (b'}', "`,` or `}`")
            } else {
                (b']', "`,` or `]`")
            };
            if skip_whitespace(src)? == Some(close) {
                src.bump();
                return Ok(());
            }
            loop {
                if open == b'{' {
                    skip_whitespace(src)?;
                    expect(src, b'"', "a member name")?;
                    skip_string_content(src)?;
                    skip_whitespace(src)?;
                    expect(src, b':', "`:`")?;
                }
                skip_value(src, scratch, depth + 1, limit)?;
                let next = skip_whitespace(src)?;
                let pos = src.position();
                match next {
                    Some(b',') => {
                        src.bump();
                        after_comma(src, close)?;
                    }
                    Some(b) if b == close => {
                        src.bump();
                        return Ok(());
                    }
                    other => return Err(unexpected(other, pos, expected)),
                }
            }
        }
        Some(b'"') => {
            src.bump();
            skip_string_content(src)
        }
        Some(b't' | b'f') => read_bool(src).map(drop),
        Some(b'n') => read_null(src),
        Some(b'-' | b'0'..=b'9') => scan_number(src, scratch).map(drop),
        other => Err(unexpected(other, pos, "a value")),
    }
}
