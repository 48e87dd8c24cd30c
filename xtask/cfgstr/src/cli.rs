// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

use std::path::PathBuf;

use cfgstring::{DEFAULT_MAX_DEPTH, DEFAULT_PAGE_SIZE, ParserConfig};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cfgstr", version)]
#[command(about = "Inspect RISC-V config strings", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub limits: Limits,

    #[command(subcommand)]
    pub command: Commands,
}

/// Parser limits shared by every subcommand.
#[derive(Args, Debug)]
pub struct Limits {
    /// Deepest scope the parser descends into
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Granularity the flat layout is rounded up to
    #[arg(long, global = true, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,
}

impl Limits {
    pub fn parser_config(&self) -> ParserConfig {
        ParserConfig::new()
            .with_max_depth(self.max_depth)
            .with_page_size(self.page_size)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the devices and their resources
    Devices {
        /// Config string file
        file: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Query the value of a dotted key
    Get {
        /// Config string file
        file: PathBuf,

        /// Dotted key path, e.g. `core.0.0.isa`
        key: String,

        /// Search within this device's scope instead of the whole document
        #[arg(short, long)]
        device: Option<String>,

        /// Print the decoded string instead of a number
        #[arg(short, long)]
        string: bool,
    },

    /// Print the zones of the flat device image
    Layout {
        /// Config string file
        file: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        /// Also write the image to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
