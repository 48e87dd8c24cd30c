// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

use alloc::string::String;
use core::{fmt, ops::Range};

use crate::{devices, lookup};

/// An immutable config string located somewhere in memory.
///
/// The text ends at the first NUL byte or at the end of the buffer,
/// whichever comes first. It is never modified; everything derived from it
/// refers back to it through byte offsets.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ConfigText<'a> {
    data: &'a [u8],
}

impl fmt::Debug for ConfigText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigText")
            .field("len", &self.data.len())
            .finish()
    }
}

impl<'a> ConfigText<'a> {
    /// Wrap a buffer, cutting it at the first NUL byte.
    pub fn new(data: &'a [u8]) -> Self {
        let len = data.iter().position(|&c| c == 0).unwrap_or(data.len());
        Self { data: &data[..len] }
    }

    /// Length of the text in bytes, terminator excluded.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Bytes in `range`, clamped to the text.
    pub fn slice(&self, range: Range<usize>) -> &'a [u8] {
        let end = range.end.min(self.data.len());
        let start = range.start.min(end);
        &self.data[start..end]
    }

    /// Offset of the first value of the dotted `key`, searching the whole text.
    pub fn find(&self, key: &str) -> Option<usize> {
        let end = self.data.len();
        let value = lookup::find_key(self.data, 0, end, key, true);
        (value < end).then_some(value)
    }

    /// Numeric value of a document-level key, `0` when absent or malformed.
    pub fn u64(&self, key: &str) -> u64 {
        devices::read_u64(self.data, 0..self.data.len(), key, "config")
    }

    /// Decoded string value of a document-level key.
    pub fn string(&self, key: &str) -> Option<String> {
        devices::read_string(self.data, 0..self.data.len(), key)
    }
}
