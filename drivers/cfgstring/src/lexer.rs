// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Cursor primitives over a config string.
//!
//! Every function takes the text and a byte cursor and returns an advanced
//! cursor. A NUL byte or the end of the slice terminates the text; no
//! primitive moves past it, and none moves backward.

use alloc::{vec, vec::Vec};

use crate::error::{ConfigError, Result};

/// Byte at `pos`, or NUL past the end of the text.
#[inline(always)]
pub fn byte_at(text: &[u8], pos: usize) -> u8 {
    text.get(pos).copied().unwrap_or(0)
}

/// Whether `c` may appear in a bare key or value token.
///
/// This is the printable range `#`..=`z` minus `;`, which leaves out the
/// structural bytes `"`, `{`, `}`, `;` and whitespace.
#[inline(always)]
pub const fn is_key_byte(c: u8) -> bool {
    c >= 35 && c <= 122 && c != b';'
}

/// Skip spaces and control characters, newlines included.
pub fn skip_whitespace(text: &[u8], mut pos: usize) -> usize {
    loop {
        let c = byte_at(text, pos);
        if c == 0 || c > b' ' {
            return pos;
        }
        pos += 1;
    }
}

/// Like [`skip_whitespace`], but stop right after the first `'\n'`.
pub fn skip_newline(text: &[u8], mut pos: usize) -> usize {
    loop {
        let c = byte_at(text, pos);
        if c == 0 || c > b' ' {
            return pos;
        }
        pos += 1;
        if c == b'\n' {
            return pos;
        }
    }
}

/// Skip the body of a quoted string. `pos` is just past the opening quote.
///
/// Escapes are not interpreted, so the closing quote is the first `"` found.
pub fn skip_string(text: &[u8], mut pos: usize) -> usize {
    loop {
        let c = byte_at(text, pos);
        if c == 0 {
            return pos;
        }
        pos += 1;
        if c == b'"' {
            return pos;
        }
    }
}

/// Skip a bare key or value token.
pub fn skip_key(text: &[u8], mut pos: usize) -> usize {
    while is_key_byte(byte_at(text, pos)) {
        pos += 1;
    }
    pos
}

#[inline(always)]
fn digit_value(c: u8, radix: u32) -> Option<u64> {
    (c as char).to_digit(radix).map(u64::from)
}

/// Accumulate digits in `radix`, ignoring `_` separators.
///
/// Stops at the first byte that is not a digit, or before the digit that
/// would overflow. Returns the value, the cursor and the digit count.
fn parse_radix(text: &[u8], mut pos: usize, radix: u32) -> (u64, usize, usize) {
    let mut value: u64 = 0;
    let mut digits = 0;
    loop {
        let c = byte_at(text, pos);
        if c == b'_' {
            pos += 1;
            continue;
        }
        let Some(digit) = digit_value(c, radix) else {
            break;
        };
        let Some(next) = value
            .checked_mul(u64::from(radix))
            .and_then(|v| v.checked_add(digit))
        else {
            break;
        };
        value = next;
        digits += 1;
        pos += 1;
    }
    (value, pos, digits)
}

/// Parse hex digits. `pos` points just past the `0x` prefix.
pub fn parse_hex(text: &[u8], pos: usize) -> (u64, usize) {
    let (value, end, _) = parse_radix(text, pos, 16);
    (value, end)
}

/// Parse decimal digits.
pub fn parse_decimal(text: &[u8], pos: usize) -> (u64, usize) {
    let (value, end, _) = parse_radix(text, pos, 10);
    (value, end)
}

/// Parse an optionally negative hex (`0x`) or decimal number.
///
/// A leading `-` negates the result with two's-complement wraparound. When
/// no digit is found the cursor is left at `pos`. Callers detect trailing
/// garbage by comparing the returned cursor with [`skip_key`].
pub fn parse_u64(text: &[u8], pos: usize) -> (u64, usize) {
    let mut cur = pos;
    let negative = byte_at(text, cur) == b'-';
    if negative {
        cur += 1;
    }

    let (value, end, digits) = if byte_at(text, cur) == b'0' && byte_at(text, cur + 1) == b'x' {
        parse_radix(text, cur + 2, 16)
    } else {
        parse_radix(text, cur, 10)
    };

    if digits == 0 {
        return (0, pos);
    }
    if negative {
        (value.wrapping_neg(), end)
    } else {
        (value, end)
    }
}

/// Parse the numeric token at `pos`, rejecting trailing garbage.
pub fn parse_value(text: &[u8], pos: usize) -> Result<(u64, usize)> {
    if byte_at(text, pos) == b'"' {
        return Err(ConfigError::NotANumber { offset: pos });
    }
    let (value, end) = parse_u64(text, pos);
    if end == pos || end != skip_key(text, pos) {
        return Err(ConfigError::MalformedNumber { offset: pos });
    }
    Ok((value, end))
}

/// Bounded writer that always leaves room for a NUL terminator.
struct StringSink<'d> {
    dest: &'d mut [u8],
    len: usize,
}

impl<'d> StringSink<'d> {
    fn new(dest: &'d mut [u8]) -> Self {
        Self { dest, len: 0 }
    }

    fn push(&mut self, c: u8) {
        if self.len + 1 < self.dest.len() {
            self.dest[self.len] = c;
        }
        self.len += 1;
    }

    /// Terminate the output and return the untruncated length, NUL included.
    fn finish(self) -> usize {
        if let Some(last) = self.dest.len().checked_sub(1) {
            self.dest[self.len.min(last)] = 0;
        }
        self.len + 1
    }
}

/// Decode a quoted string. `pos` points at the opening quote.
///
/// `\xH` and `\xHH` escapes are decoded. At most `dest.len()` bytes are
/// written, always NUL-terminated when `dest` is not empty. Returns the
/// length the full string needs (terminator included) and the cursor past
/// the closing quote.
pub fn parse_quoted_string(text: &[u8], pos: usize, dest: &mut [u8]) -> (usize, usize) {
    let mut sink = StringSink::new(dest);
    let mut pos = pos + 1;
    loop {
        match byte_at(text, pos) {
            0 => break,
            b'"' => {
                pos += 1;
                break;
            }
            b'\\' if byte_at(text, pos + 1) == b'x' => {
                let mut value = 0u8;
                let mut digits = 0;
                pos += 2;
                while digits < 2 {
                    let Some(d) = digit_value(byte_at(text, pos), 16) else {
                        break;
                    };
                    value = (value << 4) | d as u8;
                    digits += 1;
                    pos += 1;
                }
                if digits == 0 {
                    sink.push(b'\\');
                    sink.push(b'x');
                } else {
                    sink.push(value);
                }
            }
            c => {
                sink.push(c);
                pos += 1;
            }
        }
    }
    (sink.finish(), pos)
}

/// Decode a quoted string or a bare token at `pos`.
///
/// Same contract as [`parse_quoted_string`].
pub fn parse_string(text: &[u8], pos: usize, dest: &mut [u8]) -> (usize, usize) {
    if byte_at(text, pos) == b'"' {
        return parse_quoted_string(text, pos, dest);
    }
    let end = skip_key(text, pos);
    let mut sink = StringSink::new(dest);
    for &c in &text[pos..end] {
        sink.push(c);
    }
    (sink.finish(), end)
}

/// Decode the string at `pos` into an owned buffer, without terminator.
pub fn decode_string(text: &[u8], pos: usize) -> (Vec<u8>, usize) {
    let (len, _) = parse_string(text, pos, &mut []);
    let mut buf = vec![0u8; len];
    let (_, end) = parse_string(text, pos, &mut buf);
    buf.pop();
    (buf, end)
}
