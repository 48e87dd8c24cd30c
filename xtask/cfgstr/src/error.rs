// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

use std::path::PathBuf;

use cfgstring::LayoutError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("cannot access {path}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no device named `{0}`")]
    DeviceNotFound(String),

    #[error("key `{key}` not found in {scope}")]
    KeyNotFound { key: String, scope: String },

    #[error("value of `{0}` is not a number")]
    NotANumber(String),

    #[error("cannot build flat image: {0}")]
    Layout(LayoutError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ToolError>;
