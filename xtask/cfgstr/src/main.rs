// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

//! Host-side tool for inspecting RISC-V config strings.
//!
//! Diagnostics from the parser go through `log`; set `RUST_LOG=debug` to
//! see every entry it skips.

mod cli;
mod commands;
mod error;
mod report;

use std::io;

use clap::Parser;
use cli::{Cli, Commands};

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.limits.parser_config();
    let mut out = io::stdout().lock();
    match &cli.command {
        Commands::Devices { file, json } => commands::devices(&mut out, file, *json, &config),
        Commands::Get {
            file,
            key,
            device,
            string,
        } => commands::get(&mut out, file, key, device.as_deref(), *string, &config),
        Commands::Layout { file, json, output } => {
            commands::layout(&mut out, file, *json, output.as_ref(), &config)
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!("cfgstr: {err:#}");
        std::process::exit(1);
    }
}
