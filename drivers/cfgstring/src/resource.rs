// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

use alloc::string::String;

use bitflags::bitflags;

bitflags! {
    /// Resource class, using the Linux `IORESOURCE_*` bit values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResourceFlags: u32 {
        /// Memory-mapped register window.
        const MEM = 0x0000_0200;
        /// Interrupt line.
        const IRQ = 0x0000_0400;
        /// Bus number range.
        const BUS = 0x0000_1000;
    }
}

impl ResourceFlags {
    /// Class selected by a resource key, if `key` is one.
    pub fn from_key(key: &[u8]) -> Option<Self> {
        match key {
            b"irq" => Some(Self::IRQ),
            b"bus" => Some(Self::BUS),
            b"mem" => Some(Self::MEM),
            _ => None,
        }
    }

    /// Short lowercase name of the class.
    pub fn kind(&self) -> &'static str {
        if self.contains(Self::IRQ) {
            "irq"
        } else if self.contains(Self::BUS) {
            "bus"
        } else if self.contains(Self::MEM) {
            "mem"
        } else {
            "none"
        }
    }
}

/// A named, flagged `[start, end]` range owned by a device.
///
/// Scalar values are stored with `start == end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub name: String,
    pub flags: ResourceFlags,
    pub start: u64,
    pub end: u64,
    /// Written as two endpoints rather than one value.
    pub range: bool,
}

impl Resource {
    pub fn single(name: String, flags: ResourceFlags, value: u64) -> Self {
        Self {
            name,
            flags,
            start: value,
            end: value,
            range: false,
        }
    }

    pub fn range(name: String, flags: ResourceFlags, start: u64, end: u64) -> Self {
        Self {
            name,
            flags,
            start,
            end,
            range: true,
        }
    }

    /// Whether the resource was given as two endpoints.
    pub fn is_range(&self) -> bool {
        self.range
    }

    /// Inclusive size of the range.
    pub fn size(&self) -> u64 {
        self.end.wrapping_sub(self.start).wrapping_add(1)
    }
}
