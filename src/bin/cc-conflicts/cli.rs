//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

/// Find C/C++ libraries of a Bazel registry that cannot be linked together
#[derive(Parser)]
#[command(name = "cc-conflicts")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Modules to scan, as `name` or `name@version`
    #[arg(required = true, value_name = "MODULE")]
    pub modules: Vec<String>,

    /// Registry checkout containing `modules/`
    #[arg(long, default_value = ".")]
    pub registry: PathBuf,

    /// Number of libraries per combination [default: number of modules]
    #[arg(short = 'k', long, value_name = "N")]
    pub max_combination_size: Option<usize>,

    /// Only test combinations involving this module
    #[arg(long, value_name = "MODULE")]
    pub anchor: Option<String>,

    /// Bazel launcher [default: bazelisk or bazel from PATH]
    #[arg(long, env = "CC_CONFLICTS_BAZEL", value_name = "PATH")]
    pub bazel: Option<PathBuf>,

    /// Configuration file [default: ./cc-conflicts.toml if present]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Keep the scratch workspace after the scan
    #[arg(long)]
    pub keep_workspace: bool,

    /// Output format: human, json
    #[arg(long, default_value = "human")]
    pub output_format: String,

    /// Coloring: auto, always, never
    #[arg(long, default_value = "auto")]
    pub color: String,

    /// Enable verbose output
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Print only the report and errors
    #[arg(short, long)]
    pub quiet: bool,
}
