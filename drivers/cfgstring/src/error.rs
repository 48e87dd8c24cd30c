// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Error types for config string parsing and layout.

use alloc::string::String;
use core::fmt;

use crate::layout::Pass;

/// Recoverable problems found while reading a config string.
///
/// None of these abort parsing: the offending value is treated as absent
/// and the rest of the document is still processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The dotted key has no value in the searched range.
    KeyNotFound { key: String },

    /// A numeric token carries trailing bytes that are not digits.
    MalformedNumber { offset: usize },

    /// A numeric key was given a quoted string.
    NotANumber { offset: usize },

    /// A value line carries a number of values that cannot form a resource.
    BadValueCount { offset: usize, count: usize },

    /// Scopes nest deeper than [`ParserConfig::max_depth`](crate::ParserConfig).
    TooDeep { offset: usize, depth: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyNotFound { key } => write!(f, "key `{}` not found", key),
            Self::MalformedNumber { offset } => {
                write!(f, "malformed number at offset {:#x}", offset)
            }
            Self::NotANumber { offset } => {
                write!(f, "expected a number at offset {:#x}, found a string", offset)
            }
            Self::BadValueCount { offset, count } => {
                write!(
                    f,
                    "resource at offset {:#x} has {} values, expected 1 or 2",
                    offset, count
                )
            }
            Self::TooDeep { offset, depth } => {
                write!(
                    f,
                    "scope at offset {:#x} exceeds nesting depth {}",
                    offset, depth
                )
            }
        }
    }
}

/// Errors raised while compacting devices into a [`FlatImage`](crate::FlatImage).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    /// An offset inside the image does not fit the 32-bit record fields.
    TooLarge { size: usize },

    /// The page size is zero or not a power of two.
    InvalidPageSize { page_size: usize },

    /// A later pass produced a different count than the measuring pass.
    CountMismatch {
        pass: Pass,
        expected: usize,
        actual: usize,
    },

    /// The image is truncated or a record points outside of it.
    Corrupted { offset: usize },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { size } => write!(f, "layout of {:#x} bytes is too large", size),
            Self::InvalidPageSize { page_size } => {
                write!(f, "invalid page size {:#x}", page_size)
            }
            Self::CountMismatch {
                pass,
                expected,
                actual,
            } => write!(
                f,
                "materialized {} entries where {} measured {}",
                actual, pass, expected
            ),
            Self::Corrupted { offset } => write!(f, "corrupted layout at offset {:#x}", offset),
        }
    }
}

/// Result type for config string operations.
pub type Result<T> = core::result::Result<T, ConfigError>;
