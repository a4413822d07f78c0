// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spelldeck — printable spell cards from a JSON catalogue
//
// Entry point. Initialises logging and hands the command line to `cli`.

mod cli;
mod services;

use tracing_subscriber::EnvFilter;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let default_level = if cli::wants_verbose(&args) { "debug" } else { "info" };

    // Logs go to stderr so `generate --stdout` output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("spelldeck starting");

    std::process::exit(cli::run_with_args(&args));
}
