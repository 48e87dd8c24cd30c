// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Serializable views of the parser output.

use cfgstring::{FlatLayout, PlatformDevice, Resource};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DeviceView<'a> {
    pub name: &'a str,
    pub id: i32,
    pub driver: Option<&'a str>,
    /// Byte range of the device scope in the source text.
    pub config: [usize; 2],
    pub resources: Vec<ResourceView<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ResourceView<'a> {
    pub name: &'a str,
    pub kind: &'static str,
    pub flags: u32,
    pub start: u64,
    pub end: u64,
    pub range: bool,
}

impl<'a> From<&'a PlatformDevice<'_>> for DeviceView<'a> {
    fn from(dev: &'a PlatformDevice<'_>) -> Self {
        Self {
            name: &dev.name,
            id: dev.id,
            driver: dev.driver_override.as_deref(),
            config: [dev.config.start, dev.config.end],
            resources: dev.resources.iter().map(ResourceView::from).collect(),
        }
    }
}

impl<'a> From<&'a Resource> for ResourceView<'a> {
    fn from(res: &'a Resource) -> Self {
        Self {
            name: &res.name,
            kind: res.flags.kind(),
            flags: res.flags.bits(),
            start: res.start,
            end: res.end,
            range: res.is_range(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LayoutView {
    pub devices: usize,
    pub resources: usize,
    pub name_bytes: usize,
    pub devices_offset: usize,
    pub resources_offset: usize,
    pub names_offset: usize,
    pub size: usize,
}

impl From<&FlatLayout> for LayoutView {
    fn from(layout: &FlatLayout) -> Self {
        Self {
            devices: layout.num_devices(),
            resources: layout.num_resources,
            name_bytes: layout.name_bytes,
            devices_offset: layout.devices_offset,
            resources_offset: layout.resources_offset,
            names_offset: layout.names_offset,
            size: layout.size,
        }
    }
}
