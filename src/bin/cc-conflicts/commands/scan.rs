//! `cc-conflicts` scan command

use std::io::IsTerminal;

use anyhow::{Context, Result};

use crate::cli::Cli;
use cc_conflicts::ops::scan::{scan, ModuleSpec, ScanOptions};
use cc_conflicts::report::{format_report, format_report_json, OutputFormat};
use cc_conflicts::util::shell::{ColorChoice, Shell};
use cc_conflicts::util::Config;

/// Run the scan and print the report. Returns whether the scan passed.
pub fn execute(args: Cli) -> Result<bool> {
    let output_format: OutputFormat = args
        .output_format
        .parse()
        .with_context(|| format!("invalid output format: {}", args.output_format))?;

    let color: ColorChoice = args
        .color
        .parse()
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let modules = args
        .modules
        .iter()
        .map(|m| m.parse::<ModuleSpec>())
        .collect::<Result<Vec<_>, _>>()?;

    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let config = Config::discover(args.config.as_deref(), &cwd)?;

    let shell = Shell::from_flags(
        args.quiet,
        args.verbose,
        color,
        output_format == OutputFormat::Json,
    );

    let options = ScanOptions {
        modules,
        registry: args.registry,
        combination_size: args.max_combination_size,
        anchor: args.anchor,
        bazel: args.bazel,
        keep_workspace: args.keep_workspace,
        config,
    };

    let report = scan(&options, &shell)?;

    // Print the formatted report based on output format
    let output = match output_format {
        OutputFormat::Human => {
            format_report(&report, color.enabled_for(std::io::stdout().is_terminal()))
        }
        OutputFormat::Json => format_report_json(&report),
    };
    print!("{}", output);

    Ok(report.passed())
}
