// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Scoped key lookup.
//!
//! A key path such as `core.0.0.isa` names the value of `isa` inside the
//! block of `0`, inside the block of `0`, inside the block of `core`. The
//! search walks sibling entries in source order and descends only into the
//! blocks whose key is a prefix of the path, so unrelated sibling scopes can
//! never shadow a match.

use log::error;

use crate::{
    config::DEFAULT_MAX_DEPTH,
    error::ConfigError,
    lexer::{byte_at, skip_key, skip_string, skip_whitespace},
};

/// How deep a search may descend, and whether hitting the limit is logged.
#[derive(Clone, Copy)]
struct DepthLimit {
    max: usize,
    quiet: bool,
}

enum Scan {
    /// Cursor of the first value byte of the matched key.
    Found(usize),
    /// The scope ended without a match. Cursor past its closing brace.
    End(usize),
}

/// Find the value of the dotted key `name` within `[start, end)`.
///
/// Returns the cursor of the first value byte, or `end` when the key is not
/// present. Only the head of a multi-value line is returned, and a block is
/// never a value: looking up `a` in `a { b 5; }` finds nothing.
///
/// With `take == false` nothing is matched. `start` is taken to be inside a
/// scope, and the cursor just past that scope's closing brace is returned
/// (or `end` if the scope is not closed in range).
pub fn find_key(text: &[u8], start: usize, end: usize, name: &str, take: bool) -> usize {
    let end = end.min(text.len());
    if !take {
        return skip_scope(text, start, end);
    }
    find_key_with_depth(text, start, end, name, DEFAULT_MAX_DEPTH, false)
}

/// [`find_key`] with at most `max_depth` nested blocks entered below `start`.
///
/// Deeper blocks are skipped. With `quiet` set the skip is not logged, for
/// callers that report the overflow themselves.
pub(crate) fn find_key_with_depth(
    text: &[u8],
    start: usize,
    end: usize,
    name: &str,
    max_depth: usize,
    quiet: bool,
) -> usize {
    let end = end.min(text.len());
    let limit = DepthLimit {
        max: max_depth,
        quiet,
    };
    match scan_scope(text, start, end, name.as_bytes(), 0, limit) {
        Scan::Found(value) => value,
        Scan::End(_) => end,
    }
}

/// Skip to just past the brace closing the scope that `pos` is inside of.
///
/// Iterative, so hostile nesting cannot exhaust the stack.
pub(crate) fn skip_scope(text: &[u8], mut pos: usize, end: usize) -> usize {
    let mut depth = 1usize;
    while pos < end {
        match byte_at(text, pos) {
            0 => return end,
            b'"' => {
                pos = skip_string(text, pos + 1);
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return pos + 1;
                }
            }
            _ => {}
        }
        pos += 1;
    }
    end
}

/// Remainder of `name` after `key.`, if `key` is a path prefix of `name`.
fn path_suffix<'n>(key: &[u8], name: &'n [u8]) -> Option<&'n [u8]> {
    name.strip_prefix(key)?.strip_prefix(b".")
}

fn scan_scope(
    text: &[u8],
    mut pos: usize,
    end: usize,
    name: &[u8],
    depth: usize,
    limit: DepthLimit,
) -> Scan {
    loop {
        pos = skip_whitespace(text, pos);
        if pos >= end {
            return Scan::End(end);
        }
        match byte_at(text, pos) {
            0 => return Scan::End(end),
            b'}' => return Scan::End(pos + 1),
            b';' => {
                pos += 1;
                continue;
            }
            b'{' => {
                // Anonymous block, transparent to the path.
                pos = match descend(text, pos + 1, end, name, depth, limit) {
                    Scan::Found(value) => return Scan::Found(value),
                    Scan::End(next) => next,
                };
                continue;
            }
            b'"' => {
                pos = skip_string(text, pos + 1);
                continue;
            }
            _ => {}
        }

        let key_end = skip_key(text, pos);
        if key_end == pos {
            // Not a key byte at all.
            pos += 1;
            continue;
        }
        let key = &text[pos..key_end];
        let exact = key == name;
        let suffix = path_suffix(key, name);
        pos = key_end;

        loop {
            pos = skip_whitespace(text, pos);
            if pos >= end {
                return Scan::End(end);
            }
            match byte_at(text, pos) {
                0 => return Scan::End(end),
                b';' => {
                    pos += 1;
                    break;
                }
                b'}' => break,
                b'{' => {
                    pos = match suffix {
                        Some(rest) => match descend(text, pos + 1, end, rest, depth, limit) {
                            Scan::Found(value) => return Scan::Found(value),
                            Scan::End(next) => next,
                        },
                        None => skip_scope(text, pos + 1, end),
                    };
                    let next = skip_whitespace(text, pos);
                    if next < end && byte_at(text, next) == b';' {
                        pos = next + 1;
                    }
                    break;
                }
                b'"' => {
                    if exact {
                        return Scan::Found(pos);
                    }
                    pos = skip_string(text, pos + 1);
                }
                _ => {
                    if exact {
                        return Scan::Found(pos);
                    }
                    let token_end = skip_key(text, pos);
                    pos = if token_end == pos { pos + 1 } else { token_end };
                }
            }
        }
    }
}

fn descend(
    text: &[u8],
    pos: usize,
    end: usize,
    name: &[u8],
    depth: usize,
    limit: DepthLimit,
) -> Scan {
    if depth + 1 > limit.max {
        if !limit.quiet {
            error!(
                "config string: {}",
                ConfigError::TooDeep {
                    offset: pos,
                    depth: limit.max,
                }
            );
        }
        return Scan::End(skip_scope(text, pos, end));
    }
    scan_scope(text, pos, end, name, depth + 1, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'t>(text: &'t [u8], name: &str) -> Option<&'t [u8]> {
        let value = find_key(text, 0, text.len(), name, true);
        (value < text.len()).then(|| &text[value..skip_key(text, value).max(value + 1)])
    }

    #[test]
    fn finds_nested_dotted_key() {
        let text = b"{ a { b 5; } }";
        assert_eq!(lookup(text, "a.b"), Some(&b"5"[..]));
        assert_eq!(lookup(text, "a"), None);
    }

    #[test]
    fn first_match_wins() {
        let text = b"x 1; x 2;";
        assert_eq!(lookup(text, "x"), Some(&b"1"[..]));
    }

    #[test]
    fn sibling_scopes_do_not_shadow() {
        let text = b"other { x 1; }; x 2;";
        assert_eq!(lookup(text, "x"), Some(&b"2"[..]));
    }

    #[test]
    fn skip_mode_returns_scope_end() {
        let text = b"a { b \"}\"; c { } } tail";
        assert_eq!(find_key(text, 3, text.len(), "", false), 18);
    }

    #[test]
    fn depth_limit_counts_from_start() {
        let text = b"{ { x 1; } }";
        let len = text.len();
        assert_eq!(find_key_with_depth(text, 0, len, "x", 2, true), 6);
        assert_eq!(find_key_with_depth(text, 0, len, "x", 1, true), len);
        assert_eq!(find_key_with_depth(text, 2, len, "x", 1, true), 6);
    }
}
