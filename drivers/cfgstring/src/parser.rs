// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Structural parser turning a config string into platform devices.
//!
//! The grammar is `scope := (key (value* | '{' scope '}') ';'?)*`. A braced
//! scope containing an `interface` key is a device. Its name is the dotted
//! path of the scope keys leading to it, restarting after the nearest
//! enclosing device, so nested devices are independent of each other.
//!
//! Recursion state is a small value type handed down into every nested
//! scope and handed back with the advanced cursor. Sibling scopes therefore
//! never observe each other's state except through that return value.

use alloc::{string::String, vec::Vec};
use core::ops::Range;

use log::{debug, error, warn};

use crate::{
    config::ParserConfig,
    devices::PlatformDevice,
    error::ConfigError,
    lexer::{byte_at, decode_string, parse_value, skip_key, skip_string, skip_whitespace},
    lookup::{find_key_with_depth, skip_scope},
    resource::{Resource, ResourceFlags},
    text::ConfigText,
};

/// One key on the dotted path leading to a scope.
///
/// Segments live on the parser's call stack and link to their parent, so a
/// chain is only valid while the scopes it names are being parsed.
#[derive(Debug, Clone, Copy)]
pub struct PathSegment<'p> {
    start: usize,
    end: usize,
    parent: Option<&'p PathSegment<'p>>,
}

impl<'p> PathSegment<'p> {
    /// A segment naming the key at `key` in the text.
    pub fn new(key: Range<usize>, parent: Option<&'p PathSegment<'p>>) -> Self {
        Self {
            start: key.start,
            end: key.end,
            parent,
        }
    }
}

/// Join the keys of `segment` and its ancestors with `.`, outermost first.
///
/// An empty path is spelled `"."`.
pub fn config_path(text: &[u8], segment: Option<&PathSegment<'_>>) -> String {
    let Some(segment) = segment else {
        return String::from(".");
    };
    let mut path = String::new();
    config_path_helper(text, segment, &mut path);
    path
}

fn config_path_helper(text: &[u8], segment: &PathSegment<'_>, path: &mut String) {
    if let Some(parent) = segment.parent {
        config_path_helper(text, parent, path);
        path.push('.');
    }
    let key = text.get(segment.start..segment.end).unwrap_or_default();
    path.push_str(&String::from_utf8_lossy(key));
}

/// Per-scope parser state, passed by value.
#[derive(Clone, Copy)]
struct ScopeState<'p> {
    /// Path since the nearest enclosing device.
    parent: Option<&'p PathSegment<'p>>,
    /// Resource class inherited from an `irq`/`bus`/`mem` block.
    flags: ResourceFlags,
    /// Index of the nearest enclosing device.
    device: Option<usize>,
    cursor: usize,
    depth: usize,
}

/// Up to two value tokens of a line, plus the total count.
#[derive(Default)]
struct ValueLine {
    heads: [usize; 2],
    count: usize,
}

impl ValueLine {
    fn push(&mut self, pos: usize) {
        if let Some(slot) = self.heads.get_mut(self.count) {
            *slot = pos;
        }
        self.count += 1;
    }

    fn first(&self) -> Option<usize> {
        (self.count > 0).then_some(self.heads[0])
    }
}

pub(crate) struct Parser<'a> {
    text: ConfigText<'a>,
    config: ParserConfig,
    devices: Vec<PlatformDevice<'a>>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(text: ConfigText<'a>, config: ParserConfig) -> Self {
        Self {
            text,
            config,
            devices: Vec::new(),
        }
    }

    /// Parse the whole document and return its devices in source order.
    pub(crate) fn parse(mut self) -> Vec<PlatformDevice<'a>> {
        let len = self.text.len();
        let mut state = ScopeState {
            parent: None,
            flags: ResourceFlags::empty(),
            device: None,
            cursor: 0,
            depth: 0,
        };
        while state.cursor < len {
            state = self.parse_scope(state);
            if state.cursor < len {
                debug!(
                    "config string: unbalanced `}}` at offset {:#x}",
                    state.cursor - 1
                );
            }
        }
        self.devices
    }

    fn parse_scope<'p>(&mut self, mut state: ScopeState<'p>) -> ScopeState<'p> {
        let text = self.text.as_bytes();
        let len = text.len();
        loop {
            let pos = skip_whitespace(text, state.cursor);
            if pos >= len {
                state.cursor = len;
                return state;
            }
            match text[pos] {
                b'}' => {
                    state.cursor = pos + 1;
                    return state;
                }
                b';' => {
                    state.cursor = pos + 1;
                    continue;
                }
                b'{' => {
                    state.cursor = self.parse_block(state, pos + 1, None);
                    continue;
                }
                b'"' => {
                    debug!("config string: stray string at offset {:#x}", pos);
                    state.cursor = skip_string(text, pos + 1);
                    continue;
                }
                _ => {}
            }

            let key_end = skip_key(text, pos);
            if key_end == pos {
                debug!(
                    "config string: unexpected byte {:#04x} at offset {:#x}",
                    text[pos], pos
                );
                state.cursor = pos + 1;
                continue;
            }
            state.cursor = self.parse_entry(state, pos..key_end);
        }
    }

    /// Parse one `key ...;` or `key { ... }` entry, returning the cursor past it.
    fn parse_entry(&mut self, state: ScopeState<'_>, key: Range<usize>) -> usize {
        let text = self.text.as_bytes();
        let class = ResourceFlags::from_key(&text[key.clone()]);

        let mut pos = skip_whitespace(text, key.end);
        if byte_at(text, pos) == b'{' {
            let cursor = self.parse_block(state, pos + 1, Some((key, class)));
            let next = skip_whitespace(text, cursor);
            return if byte_at(text, next) == b';' {
                next + 1
            } else {
                cursor
            };
        }

        let mut line = ValueLine::default();
        loop {
            pos = skip_whitespace(text, pos);
            match byte_at(text, pos) {
                0 => break,
                b';' => {
                    pos += 1;
                    break;
                }
                b'{' | b'}' => break,
                b'"' => {
                    line.push(pos);
                    pos = skip_string(text, pos + 1);
                }
                _ => {
                    let token_end = skip_key(text, pos);
                    if token_end == pos {
                        pos += 1;
                    } else {
                        line.push(pos);
                        pos = token_end;
                    }
                }
            }
        }

        if &text[key.clone()] == b"interface" {
            self.parse_interface(state, key.start, &line);
        } else {
            let flags = class.unwrap_or(state.flags);
            if !flags.is_empty() {
                self.parse_resource(state, key, class.is_some(), flags, &line);
            }
        }
        pos
    }

    /// Parse the body of a block. `inner` is just past its opening brace.
    fn parse_block(
        &mut self,
        state: ScopeState<'_>,
        inner: usize,
        key: Option<(Range<usize>, Option<ResourceFlags>)>,
    ) -> usize {
        let text = self.text.as_bytes();
        let len = text.len();
        if state.depth >= self.config.max_depth {
            error!(
                "config string: {}",
                ConfigError::TooDeep {
                    offset: inner,
                    depth: self.config.max_depth,
                }
            );
            return skip_scope(text, inner, len);
        }

        let Some((key, class)) = key else {
            // Anonymous block, transparent to paths and devices.
            let child = self.parse_scope(ScopeState {
                cursor: inner,
                depth: state.depth + 1,
                ..state
            });
            return child.cursor;
        };

        let segment = PathSegment::new(key, state.parent);
        // Blocks below this scope are entered at `state.depth + 1` and up.
        let below = self.config.max_depth - state.depth - 1;
        if find_key_with_depth(text, inner, len, "interface", below, true) < len {
            let index = self.devices.len();
            let name = config_path(text, Some(&segment));
            self.devices.push(PlatformDevice::new(self.text, name, inner));

            let child = self.parse_scope(ScopeState {
                parent: None,
                flags: ResourceFlags::empty(),
                device: Some(index),
                cursor: inner,
                depth: state.depth + 1,
            });
            let close = if child.cursor > inner && byte_at(text, child.cursor - 1) == b'}' {
                child.cursor - 1
            } else {
                child.cursor
            };
            self.devices[index].config = inner..close;
            return child.cursor;
        }

        let child = self.parse_scope(ScopeState {
            parent: if class.is_some() {
                state.parent
            } else {
                Some(&segment)
            },
            flags: class.unwrap_or(ResourceFlags::empty()),
            device: state.device,
            cursor: inner,
            depth: state.depth + 1,
        });
        child.cursor
    }

    fn parse_interface(&mut self, state: ScopeState<'_>, offset: usize, line: &ValueLine) {
        let text = self.text.as_bytes();
        let Some(index) = state.device else {
            debug!(
                "config string: ignoring `interface` outside of a device at offset {:#x}",
                offset
            );
            return;
        };
        let Some(value) = line.first() else {
            return;
        };
        let device = &mut self.devices[index];
        if device.driver_override.is_some() {
            debug!(
                "config string: {}: ignoring second `interface` at offset {:#x}",
                device.name, offset
            );
            return;
        }
        let (bytes, _) = decode_string(text, value);
        device.driver_override = Some(String::from_utf8_lossy(&bytes).into_owned());
    }

    fn parse_resource(
        &mut self,
        state: ScopeState<'_>,
        key: Range<usize>,
        class_key: bool,
        flags: ResourceFlags,
        line: &ValueLine,
    ) {
        let text = self.text.as_bytes();
        let Some(index) = state.device else {
            debug!(
                "config string: ignoring resource outside of a device at offset {:#x}",
                key.start
            );
            return;
        };

        let offset = key.start;
        let name = if class_key {
            config_path(text, state.parent)
        } else {
            config_path(text, Some(&PathSegment::new(key, state.parent)))
        };
        let resource = match line.count {
            0 => return,
            1 => parse_value(text, line.heads[0])
                .map(|(value, _)| Resource::single(name, flags, value)),
            2 => parse_value(text, line.heads[0]).and_then(|(start, _)| {
                parse_value(text, line.heads[1])
                    .map(|(end, _)| Resource::range(name, flags, start, end))
            }),
            count => Err(ConfigError::BadValueCount { offset, count }),
        };

        let device = &mut self.devices[index];
        match resource {
            Ok(resource) => device.resources.push(resource),
            Err(err) => warn!("config string: {}: {}", device.name, err),
        }
    }
}

/// Parse `text` into its devices.
pub(crate) fn parse_devices<'a>(
    text: ConfigText<'a>,
    config: &ParserConfig,
) -> Vec<PlatformDevice<'a>> {
    Parser::new(text, *config).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_dot() {
        assert_eq!(config_path(b"irq 3;", None), ".");
    }

    #[test]
    fn path_joins_ancestors_outermost_first() {
        let text = b"soc { bus { uart";
        let soc = PathSegment::new(0..3, None);
        let bus = PathSegment::new(6..9, Some(&soc));
        let uart = PathSegment::new(12..16, Some(&bus));
        assert_eq!(config_path(text, Some(&soc)), "soc");
        assert_eq!(config_path(text, Some(&uart)), "soc.bus.uart");
    }
}
