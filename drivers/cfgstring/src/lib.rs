// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Parser for the RISC-V *config string*.
//!
//! Before flattened device trees were adopted, RISC-V boot environments
//! described the platform with a small textual language:
//!
//! ```text
//! plic {
//!   interface "plic";
//!   ndevs 31;
//!   mem 0x40000000 0x40001fff;
//! };
//! uart {
//!   interface "sifive,uart0";
//!   irq 3;
//!   mem 0x40002000 0x40002fff;
//! };
//! ```
//!
//! Every braced scope that contains an `interface` key describes one
//! platform device. `irq`, `bus` and `mem` values become the device's
//! resources. All other keys stay in the text and are queried lazily by
//! the drivers through [`config_string_u64`] and [`config_string_str`].
//!
//! # Quick Start
//!
//! ```
//! use cfgstring::{ResourceFlags, config_find_devices, config_string_u64};
//!
//! let text = b"uart { interface \"ns16550\"; irq 3; mem 0x1000 0x1fff; clock 50_000_000; }";
//! let devices = config_find_devices(text);
//!
//! assert_eq!(devices.len(), 1);
//! assert_eq!(devices[0].name, "uart");
//! assert_eq!(devices[0].resources[0].flags, ResourceFlags::IRQ);
//! assert_eq!(config_string_u64(&devices[0], "clock"), 50_000_000);
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod config;
mod devices;
mod error;
mod layout;
pub mod lexer;
pub mod lookup;
mod parser;
mod registry;
mod resource;
mod text;

pub use config::{DEFAULT_MAX_DEPTH, DEFAULT_PAGE_SIZE, ParserConfig};
pub use devices::{
    PLATFORM_DEVID_AUTO, PlatformDevice, config_find_devices, config_find_devices_with,
    config_string_str, config_string_u64,
};
pub use error::{ConfigError, LayoutError, Result};
pub use layout::{FlatDevice, FlatImage, FlatLayout, FlatResource, Pass, RawDevice, RawResource};
pub use lookup::find_key;
pub use parser::{PathSegment, config_path};
pub use registry::{
    DeviceRegistry, RecordingRegistry, RegisteredDevice, RegistryError, RegistryResult,
    config_register_devices,
};
pub use resource::{Resource, ResourceFlags};
pub use text::ConfigText;
