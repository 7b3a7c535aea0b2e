//! cc-conflicts CLI - C/C++ library conflict detector for Bazel registries

use anyhow::Result;
use clap::Parser;
use miette::Diagnostic as _;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cc_conflicts::ScanError;
use cli::Cli;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            if let Some(help) = e.downcast_ref::<ScanError>().and_then(|se| se.help()) {
                eprintln!("help: {}", help);
            }
            std::process::exit(1);
        }
    }
}

fn run() -> Result<bool> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("cc_conflicts=debug")
    } else {
        EnvFilter::new("cc_conflicts=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    commands::scan::execute(cli)
}
