//! Byte classes of the JSON grammar.
//!
//! These work on UTF-8 bytes: every class is ASCII, and no byte of a
//! multi-byte sequence falls into any of them.

/// Insignificant whitespace: space, tab, line feed, carriage return.
#[inline]
pub const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// ASCII `0`..=`9`.
#[inline]
pub const fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

/// ASCII `0`..=`9`, `a`..=`f`, `A`..=`F`.
#[inline]
pub const fn is_hex_digit(b: u8) -> bool {
    b.is_ascii_hexdigit()
}

/// The characters that may not appear raw inside a string literal (`U+0000`..=`U+001F`).
#[inline]
pub const fn is_control(b: u8) -> bool {
    b < 0x20
}

/// Value of a hex digit, if it is one.
#[inline]
pub const fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
