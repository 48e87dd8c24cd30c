// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Platform devices found in a config string, and the attribute accessors
//! drivers use to query the rest of their scope.

use alloc::{string::String, vec::Vec};
use core::ops::Range;

use log::warn;

use crate::{
    config::ParserConfig,
    error::ConfigError,
    lexer::{decode_string, parse_string, parse_value},
    lookup::find_key,
    parser::parse_devices,
    resource::{Resource, ResourceFlags},
    text::ConfigText,
};

/// Device id asking the registry to pick one.
pub const PLATFORM_DEVID_AUTO: i32 = -1;

/// A device described by a braced scope containing an `interface` key.
#[derive(Debug, Clone)]
pub struct PlatformDevice<'a> {
    /// Dotted path of the scope keys naming the device.
    pub name: String,
    /// Always [`PLATFORM_DEVID_AUTO`].
    pub id: i32,
    /// Decoded value of the `interface` key.
    pub driver_override: Option<String>,
    pub resources: Vec<Resource>,
    /// Body of the device scope, braces excluded, as offsets into the text.
    pub config: Range<usize>,
    text: ConfigText<'a>,
}

impl<'a> PlatformDevice<'a> {
    pub(crate) fn new(text: ConfigText<'a>, name: String, config_start: usize) -> Self {
        Self {
            name,
            id: PLATFORM_DEVID_AUTO,
            driver_override: None,
            resources: Vec::new(),
            config: config_start..config_start,
            text,
        }
    }

    pub fn num_resources(&self) -> usize {
        self.resources.len()
    }

    /// The raw bytes of the device scope.
    pub fn config_bytes(&self) -> &'a [u8] {
        self.text.slice(self.config.clone())
    }

    /// Offset of the first value of `key` within the device scope.
    pub fn find_key(&self, key: &str) -> Option<usize> {
        let Range { start, end } = self.config;
        let value = find_key(self.text.as_bytes(), start, end, key, true);
        (value < end).then_some(value)
    }

    /// Same as [`config_string_u64`].
    pub fn u64(&self, key: &str) -> u64 {
        read_u64(self.text.as_bytes(), self.config.clone(), key, &self.name)
    }

    /// Decoded string value of `key`, `None` when absent.
    pub fn string(&self, key: &str) -> Option<String> {
        read_string(self.text.as_bytes(), self.config.clone(), key)
    }

    /// The `index`-th resource of class `flags`.
    pub fn resource(&self, flags: ResourceFlags, index: usize) -> Option<&Resource> {
        self.resources
            .iter()
            .filter(|res| res.flags.contains(flags))
            .nth(index)
    }
}

/// Find every device in `text`, in source order.
pub fn config_find_devices(text: &[u8]) -> Vec<PlatformDevice<'_>> {
    config_find_devices_with(text, &ParserConfig::new())
}

/// [`config_find_devices`] with explicit parser limits.
pub fn config_find_devices_with<'a>(
    text: &'a [u8],
    config: &ParserConfig,
) -> Vec<PlatformDevice<'a>> {
    parse_devices(ConfigText::new(text), config)
}

/// First numeric value of the dotted `key` within `device`'s scope.
///
/// Returns `0` and logs a warning when the key is absent or its value is
/// not a number.
pub fn config_string_u64(device: &PlatformDevice<'_>, key: &str) -> u64 {
    device.u64(key)
}

/// Copy the decoded string value of `key` into `dest`.
///
/// At most `dest.len() - 1` bytes are written, followed by a NUL. The
/// returned length counts the terminator and is the size `dest` needs to
/// hold the whole value, so a return greater than `dest.len()` means the
/// value was truncated. An absent key returns `0` and leaves `dest` empty.
pub fn config_string_str(device: &PlatformDevice<'_>, key: &str, dest: &mut [u8]) -> usize {
    let text = device.text.as_bytes();
    let Range { start, end } = device.config;
    let value = find_key(text, start, end, key, true);
    if value >= end {
        warn!(
            "config string: {}: {}",
            device.name,
            ConfigError::KeyNotFound { key: key.into() }
        );
        if let Some(first) = dest.first_mut() {
            *first = 0;
        }
        return 0;
    }
    parse_string(text, value, dest).0
}

pub(crate) fn read_u64(text: &[u8], range: Range<usize>, key: &str, owner: &str) -> u64 {
    let value = find_key(text, range.start, range.end, key, true);
    let result = if value < range.end {
        parse_value(text, value).map(|(value, _)| value)
    } else {
        Err(ConfigError::KeyNotFound { key: key.into() })
    };
    result.unwrap_or_else(|err| {
        warn!("config string: {}: {}", owner, err);
        0
    })
}

pub(crate) fn read_string(text: &[u8], range: Range<usize>, key: &str) -> Option<String> {
    let value = find_key(text, range.start, range.end, key, true);
    if value >= range.end {
        return None;
    }
    let (bytes, _) = decode_string(text, value);
    Some(String::from_utf8_lossy(&bytes).into_owned())
}
