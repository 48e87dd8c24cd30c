// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Handing parsed devices over to a platform bus.

use alloc::{string::String, vec::Vec};
use core::fmt;

use log::{info, warn};

use crate::{
    config::ParserConfig,
    devices::{PLATFORM_DEVID_AUTO, PlatformDevice},
    parser::parse_devices,
    resource::Resource,
    text::ConfigText,
};

/// The error type for registration failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// A device with the same name and id is already registered.
    AlreadyExists,
    /// The device description cannot be registered as is.
    InvalidInput,
    /// Not enough memory to record the device.
    NoMemory,
    /// This operation is unsupported by the registry.
    Unsupported,
}

impl RegistryError {
    /// Stable error message for display/logging.
    pub const fn message(&self) -> &'static str {
        match self {
            RegistryError::AlreadyExists => "Entity already exists",
            RegistryError::InvalidInput => "Invalid parameter",
            RegistryError::NoMemory => "Not enough memory",
            RegistryError::Unsupported => "Unsupported operation",
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A specialized `Result` type for registry operations.
pub type RegistryResult<T = ()> = Result<T, RegistryError>;

/// A bus that platform devices are registered with.
pub trait DeviceRegistry {
    /// Register one device.
    fn register(&mut self, device: &PlatformDevice<'_>) -> RegistryResult;

    /// Publish the raw text of a registered device's scope, for drivers
    /// and userspace that want to read keys the parser left alone.
    fn expose_config(&mut self, _device: &PlatformDevice<'_>, _raw: &[u8]) -> RegistryResult {
        Ok(())
    }
}

/// What [`RecordingRegistry`] keeps of a registered device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredDevice {
    pub name: String,
    /// Id picked at registration time.
    pub id: i32,
    pub driver_override: String,
    pub resources: Vec<Resource>,
    /// Raw scope text, once exposed.
    pub config: Option<Vec<u8>>,
}

/// A registry that only remembers what it was given.
///
/// Automatic ids are assigned in registration order. A device without an
/// `interface` value has no driver to bind and is refused, as is a device
/// with a fixed id whose name and id are already taken.
#[derive(Debug, Default)]
pub struct RecordingRegistry {
    devices: Vec<RegisteredDevice>,
}

impl RecordingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn devices(&self) -> &[RegisteredDevice] {
        &self.devices
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredDevice> {
        self.devices.iter().find(|dev| dev.name == name)
    }

    fn next_id(&self) -> i32 {
        i32::try_from(self.devices.len()).unwrap_or(i32::MAX)
    }
}

impl DeviceRegistry for RecordingRegistry {
    fn register(&mut self, device: &PlatformDevice<'_>) -> RegistryResult {
        let driver_override = device
            .driver_override
            .clone()
            .ok_or(RegistryError::InvalidInput)?;
        let id = if device.id == PLATFORM_DEVID_AUTO {
            self.next_id()
        } else {
            device.id
        };
        if self
            .devices
            .iter()
            .any(|dev| dev.name == device.name && dev.id == id)
        {
            return Err(RegistryError::AlreadyExists);
        }
        self.devices.try_reserve(1).map_err(|_| RegistryError::NoMemory)?;
        self.devices.push(RegisteredDevice {
            name: device.name.clone(),
            id,
            driver_override,
            resources: device.resources.clone(),
            config: None,
        });
        Ok(())
    }

    fn expose_config(&mut self, device: &PlatformDevice<'_>, raw: &[u8]) -> RegistryResult {
        let registered = self
            .devices
            .iter_mut()
            .rev()
            .find(|dev| dev.name == device.name)
            .ok_or(RegistryError::InvalidInput)?;
        registered.config = Some(raw.to_vec());
        Ok(())
    }
}

/// Parse `text` and register every device found in it with `registry`.
///
/// A device the registry refuses is logged and skipped. Returns the number
/// of devices registered.
pub fn config_register_devices<R>(text: &[u8], config: &ParserConfig, registry: &mut R) -> usize
where
    R: DeviceRegistry + ?Sized,
{
    let devices = parse_devices(ConfigText::new(text), config);
    let mut registered = 0;
    for dev in &devices {
        if let Err(err) = registry.register(dev) {
            warn!("config string: failed to register {}: {}", dev.name, err);
            continue;
        }
        info!(
            "registered a new platform device: {} ({}, {} resources)",
            dev.name,
            dev.driver_override.as_deref().unwrap_or("?"),
            dev.num_resources()
        );
        registered += 1;

        let raw = dev.config_bytes();
        if !raw.is_empty()
            && let Err(err) = registry.expose_config(dev, raw)
        {
            warn!("config string: {}: cannot expose config: {}", dev.name, err);
        }
    }
    registered
}
