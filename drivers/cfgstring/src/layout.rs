// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Compaction of parsed devices into one contiguous block.
//!
//! ```text
//! +--------------+ 0
//! | u32 count    |
//! +--------------+ devices_offset      (multiple of size_of::<RawDevice>())
//! | RawDevice[n] |
//! +--------------+ resources_offset    (multiple of size_of::<RawResource>())
//! | RawResource[]|
//! +--------------+ names_offset
//! | names, NUL   |
//! | terminated   |
//! +--------------+ size                (multiple of the page size)
//! ```
//!
//! Records refer to each other and to their names by byte offsets from the
//! start of the block, so the image can be copied or mapped anywhere.

use alloc::{str, vec, vec::Vec};
use core::{fmt, mem::size_of, ops::Range};

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{
    config::ParserConfig, devices::PlatformDevice, error::LayoutError, parser::parse_devices,
    resource::ResourceFlags, text::ConfigText,
};

/// The stages of building an image.
///
/// The first two only measure. The last one writes, and its counts must
/// agree with what was measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Pass {
    CountDevices = 0,
    CountResourcesAndNames = 1,
    Materialize = 2,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CountDevices => "count devices",
            Self::CountResourcesAndNames => "count resources and names",
            Self::Materialize => "materialize",
        };
        write!(f, "pass {} ({})", *self as u8, name)
    }
}

/// Device record as stored in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct RawDevice {
    /// Offset of the NUL-terminated name.
    pub name: u32,
    pub id: i32,
    /// Offset of the NUL-terminated driver override, `0` when there is none.
    pub driver_override: u32,
    /// Offset of the first [`RawResource`] of the device.
    pub resource: u32,
    pub num_resources: u32,
    /// Device scope within the source text.
    pub config_start: u32,
    pub config_end: u32,
}

/// Resource record as stored in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C)]
pub struct RawResource {
    /// Offset of the NUL-terminated name.
    pub name: u32,
    pub flags: u32,
    pub start: u64,
    pub end: u64,
}

const COUNT_SIZE: usize = size_of::<u32>();
const DEVICE_SIZE: usize = size_of::<RawDevice>();
const RESOURCE_SIZE: usize = size_of::<RawResource>();

/// Round `pos` up to a multiple of `size`, which need not be a power of two.
const fn round_up(pos: usize, size: usize) -> usize {
    pos.div_ceil(size) * size
}

const fn align_up(pos: usize, align: usize) -> usize {
    (pos + align - 1) & !(align - 1)
}

fn to_u32(value: usize) -> Result<u32, LayoutError> {
    u32::try_from(value).map_err(|_| LayoutError::TooLarge { size: value })
}

/// Sizes and zone offsets of an image, measured before anything is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatLayout {
    /// Resources of each device, in device order.
    pub resource_counts: Vec<usize>,
    /// Total resources over all devices.
    pub num_resources: usize,
    /// Bytes taken by all names, terminators included.
    pub name_bytes: usize,
    pub devices_offset: usize,
    pub resources_offset: usize,
    pub names_offset: usize,
    /// Total size, rounded up to the page size.
    pub size: usize,
}

impl FlatLayout {
    /// Measure the image holding `devices`.
    pub fn measure(
        devices: &[PlatformDevice<'_>],
        config: &ParserConfig,
    ) -> Result<Self, LayoutError> {
        let page_size = config.page_size;
        if !page_size.is_power_of_two() {
            return Err(LayoutError::InvalidPageSize { page_size });
        }

        // Pass 0.
        let num_devices = devices.len();
        // Pass 1.
        let resource_counts: Vec<usize> = devices.iter().map(|dev| dev.resources.len()).collect();
        let num_resources: usize = resource_counts.iter().sum();
        let name_bytes: usize = devices.iter().map(name_bytes).sum();

        let devices_offset = round_up(COUNT_SIZE, DEVICE_SIZE);
        let resources_offset = round_up(devices_offset + num_devices * DEVICE_SIZE, RESOURCE_SIZE);
        let names_offset = resources_offset + num_resources * RESOURCE_SIZE;
        let end = names_offset + name_bytes;
        to_u32(end)?;
        for dev in devices {
            to_u32(dev.config.end)?;
        }

        Ok(Self {
            resource_counts,
            num_resources,
            name_bytes,
            devices_offset,
            resources_offset,
            names_offset,
            size: align_up(end, page_size),
        })
    }

    pub fn num_devices(&self) -> usize {
        self.resource_counts.len()
    }
}

fn name_bytes(dev: &PlatformDevice<'_>) -> usize {
    let own = dev.name.len() + 1;
    let driver = dev.driver_override.as_ref().map_or(0, |name| name.len() + 1);
    let resources: usize = dev.resources.iter().map(|res| res.name.len() + 1).sum();
    own + driver + resources
}

/// Appends NUL-terminated names, handing back their image offsets.
struct NameTable {
    base: usize,
    bytes: Vec<u8>,
}

impl NameTable {
    fn push(&mut self, name: &str) -> Result<u32, LayoutError> {
        let offset = to_u32(self.base + self.bytes.len())?;
        self.bytes.extend_from_slice(name.as_bytes());
        self.bytes.push(0);
        Ok(offset)
    }
}

/// A materialized, self-contained device image.
#[derive(Clone, PartialEq, Eq)]
pub struct FlatImage {
    layout: FlatLayout,
    bytes: Vec<u8>,
}

impl fmt::Debug for FlatImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlatImage")
            .field("layout", &self.layout)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl FlatImage {
    /// Parse `text` and compact the devices found in it.
    pub fn from_text(text: &[u8], config: &ParserConfig) -> Result<Self, LayoutError> {
        let devices = parse_devices(ConfigText::new(text), config);
        Self::build(&devices, config)
    }

    /// Compact `devices` into a single block.
    pub fn build(devices: &[PlatformDevice<'_>], config: &ParserConfig) -> Result<Self, LayoutError> {
        let layout = FlatLayout::measure(devices, config)?;

        let mut names = NameTable {
            base: layout.names_offset,
            bytes: Vec::with_capacity(layout.name_bytes),
        };
        let mut raw_devices = Vec::with_capacity(layout.num_devices());
        let mut raw_resources = Vec::with_capacity(layout.num_resources);
        for dev in devices {
            let first = layout.resources_offset + raw_resources.len() * RESOURCE_SIZE;
            raw_devices.push(RawDevice {
                name: names.push(&dev.name)?,
                id: dev.id,
                driver_override: match &dev.driver_override {
                    Some(driver) => names.push(driver)?,
                    None => 0,
                },
                resource: to_u32(first)?,
                num_resources: to_u32(dev.resources.len())?,
                config_start: to_u32(dev.config.start)?,
                config_end: to_u32(dev.config.end)?,
            });
            for res in &dev.resources {
                raw_resources.push(RawResource {
                    name: names.push(&res.name)?,
                    flags: res.flags.bits(),
                    start: res.start,
                    end: res.end,
                });
            }
        }

        check_count(Pass::CountDevices, layout.num_devices(), raw_devices.len())?;
        check_count(
            Pass::CountResourcesAndNames,
            layout.num_resources,
            raw_resources.len(),
        )?;
        check_count(
            Pass::CountResourcesAndNames,
            layout.name_bytes,
            names.bytes.len(),
        )?;

        let mut bytes = vec![0u8; layout.size];
        bytes[..COUNT_SIZE].copy_from_slice(to_u32(raw_devices.len())?.as_bytes());
        let devices_end = layout.devices_offset + raw_devices.len() * DEVICE_SIZE;
        bytes[layout.devices_offset..devices_end].copy_from_slice(raw_devices.as_bytes());
        bytes[layout.resources_offset..layout.names_offset].copy_from_slice(raw_resources.as_bytes());
        bytes[layout.names_offset..layout.names_offset + layout.name_bytes]
            .copy_from_slice(&names.bytes);

        Ok(Self { layout, bytes })
    }

    pub fn layout(&self) -> &FlatLayout {
        &self.layout
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Read the devices back out of the image.
    pub fn devices(&self) -> Result<Vec<FlatDevice<'_>>, LayoutError> {
        Self::read(&self.bytes)
    }

    /// Read the devices out of an image produced by [`FlatImage::build`].
    pub fn read(bytes: &[u8]) -> Result<Vec<FlatDevice<'_>>, LayoutError> {
        let count: u32 = read_record(bytes, 0)?;
        (0..count as usize)
            .map(|index| read_device(bytes, index))
            .collect()
    }
}

fn read_device(bytes: &[u8], index: usize) -> Result<FlatDevice<'_>, LayoutError> {
    let devices_offset = round_up(COUNT_SIZE, DEVICE_SIZE);
    let raw: RawDevice = read_record(bytes, devices_offset + index * DEVICE_SIZE)?;
    let resources = (0..raw.num_resources as usize)
        .map(|i| read_resource(bytes, raw.resource as usize + i * RESOURCE_SIZE))
        .collect::<Result<Vec<_>, LayoutError>>()?;
    Ok(FlatDevice {
        name: name_at(bytes, raw.name)?,
        id: raw.id,
        driver_override: match raw.driver_override {
            0 => None,
            offset => Some(name_at(bytes, offset)?),
        },
        resources,
        config: raw.config_start as usize..raw.config_end as usize,
    })
}

fn read_resource(bytes: &[u8], offset: usize) -> Result<FlatResource<'_>, LayoutError> {
    let raw: RawResource = read_record(bytes, offset)?;
    Ok(FlatResource {
        name: name_at(bytes, raw.name)?,
        flags: ResourceFlags::from_bits_retain(raw.flags),
        start: raw.start,
        end: raw.end,
    })
}

fn check_count(pass: Pass, expected: usize, actual: usize) -> Result<(), LayoutError> {
    if expected == actual {
        Ok(())
    } else {
        Err(LayoutError::CountMismatch {
            pass,
            expected,
            actual,
        })
    }
}

fn read_record<T: FromBytes>(bytes: &[u8], offset: usize) -> Result<T, LayoutError> {
    let record = offset
        .checked_add(size_of::<T>())
        .and_then(|end| bytes.get(offset..end))
        .ok_or(LayoutError::Corrupted { offset })?;
    T::read_from_bytes(record).map_err(|_| LayoutError::Corrupted { offset })
}

fn name_at(bytes: &[u8], offset: u32) -> Result<&str, LayoutError> {
    let offset = offset as usize;
    let corrupted = LayoutError::Corrupted { offset };
    let tail = bytes.get(offset..).ok_or(corrupted)?;
    let len = tail.iter().position(|&c| c == 0).ok_or(corrupted)?;
    str::from_utf8(&tail[..len]).map_err(|_| corrupted)
}

/// A device read back from a [`FlatImage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatDevice<'b> {
    pub name: &'b str,
    pub id: i32,
    pub driver_override: Option<&'b str>,
    pub resources: Vec<FlatResource<'b>>,
    pub config: Range<usize>,
}

/// A resource read back from a [`FlatImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatResource<'b> {
    pub name: &'b str,
    pub flags: ResourceFlags,
    pub start: u64,
    pub end: u64,
}
