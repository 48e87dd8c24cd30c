// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

use std::{
    fs,
    io::Write,
    ops::Range,
    path::{Path, PathBuf},
};

use anyhow::Context;
use cfgstring::{
    ConfigText, FlatImage, ParserConfig, PlatformDevice, config_find_devices_with, find_key,
    lexer::{decode_string, parse_value},
};
use log::debug;

use crate::{
    error::{Result, ToolError},
    report::{DeviceView, LayoutView},
};

pub fn read_text(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn devices(
    out: &mut impl Write,
    file: &Path,
    json: bool,
    config: &ParserConfig,
) -> anyhow::Result<()> {
    let text = read_text(file)?;
    let devices = config_find_devices_with(&text, config);
    debug!("{}: {} devices", file.display(), devices.len());

    if json {
        let views: Vec<_> = devices.iter().map(DeviceView::from).collect();
        serde_json::to_writer_pretty(&mut *out, &views).map_err(ToolError::from)?;
        writeln!(out)?;
        return Ok(());
    }
    for dev in &devices {
        writeln!(
            out,
            "{} ({})",
            dev.name,
            dev.driver_override.as_deref().unwrap_or("-")
        )?;
        for res in &dev.resources {
            if res.is_range() {
                writeln!(
                    out,
                    "  {:<4} {:<12} {:#x}-{:#x}",
                    res.flags.kind(),
                    res.name,
                    res.start,
                    res.end
                )?;
            } else {
                writeln!(
                    out,
                    "  {:<4} {:<12} {:#x}",
                    res.flags.kind(),
                    res.name,
                    res.start
                )?;
            }
        }
    }
    Ok(())
}

pub fn get(
    out: &mut impl Write,
    file: &Path,
    key: &str,
    device: Option<&str>,
    string: bool,
    config: &ParserConfig,
) -> anyhow::Result<()> {
    let text = read_text(file)?;
    let devices = config_find_devices_with(&text, config);
    let bytes = ConfigText::new(&text).as_bytes();

    let (range, scope) = match device {
        Some(name) => {
            let dev = find_device(&devices, name)?;
            (dev.config.clone(), format!("device `{}`", dev.name))
        }
        None => (0..bytes.len(), String::from("the document")),
    };
    let value = lookup(bytes, range, key).ok_or_else(|| ToolError::KeyNotFound {
        key: key.into(),
        scope,
    })?;

    if string {
        let (decoded, _) = decode_string(bytes, value);
        out.write_all(&decoded)?;
        writeln!(out)?;
    } else {
        let (number, _) =
            parse_value(bytes, value).map_err(|_| ToolError::NotANumber(key.into()))?;
        writeln!(out, "{number} ({number:#x})")?;
    }
    Ok(())
}

fn find_device<'d, 'a>(
    devices: &'d [PlatformDevice<'a>],
    name: &str,
) -> Result<&'d PlatformDevice<'a>> {
    devices
        .iter()
        .find(|dev| dev.name == name)
        .ok_or_else(|| ToolError::DeviceNotFound(name.into()))
}

fn lookup(text: &[u8], range: Range<usize>, key: &str) -> Option<usize> {
    let value = find_key(text, range.start, range.end, key, true);
    (value < range.end).then_some(value)
}

pub fn layout(
    out: &mut impl Write,
    file: &Path,
    json: bool,
    output: Option<&PathBuf>,
    config: &ParserConfig,
) -> anyhow::Result<()> {
    let text = read_text(file)?;
    let image = FlatImage::from_text(&text, config).map_err(ToolError::Layout)?;
    let layout = image.layout();

    if let Some(path) = output {
        fs::write(path, image.as_bytes())
            .with_context(|| format!("failed to write image to {}", path.display()))?;
    }

    if json {
        serde_json::to_writer_pretty(&mut *out, &LayoutView::from(layout))
            .map_err(ToolError::from)?;
        writeln!(out)?;
        return Ok(());
    }
    writeln!(
        out,
        "devices   {:>6} @ {:#x}",
        layout.num_devices(),
        layout.devices_offset
    )?;
    writeln!(
        out,
        "resources {:>6} @ {:#x}",
        layout.num_resources, layout.resources_offset
    )?;
    writeln!(
        out,
        "names     {:>6} @ {:#x}",
        layout.name_bytes, layout.names_offset
    )?;
    writeln!(out, "size      {:#x}", layout.size)?;
    Ok(())
}
