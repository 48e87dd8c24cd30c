// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Parser configuration.

/// Default limit on scope nesting.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default granularity the flat layout is rounded up to.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Tunables for [`config_find_devices_with`](crate::config_find_devices_with)
/// and [`FlatImage::build`](crate::FlatImage::build).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Deepest scope the parser descends into. Deeper scopes are skipped.
    pub max_depth: usize,

    /// Allocation granularity of the flat layout. Must be a power of two.
    pub page_size: usize,
}

impl ParserConfig {
    /// Create a configuration with the default limits.
    pub const fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::new()
    }
}
