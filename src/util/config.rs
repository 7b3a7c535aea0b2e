//! Configuration file support.
//!
//! Settings are read from `cc-conflicts.toml` in the working directory, or
//! from the file given with `--config`. Every key is optional; command-line
//! flags take precedence over file values.
//!
//! ```toml
//! [bazel]
//! program = "/usr/local/bin/bazelisk"
//! startup_args = ["--output_user_root=/tmp/bazel"]
//! build_args = ["--jobs=8"]
//! use_local_registry = true
//!
//! [probe]
//! max_exhaustive_headers = 12
//!
//! [scan]
//! exclude_targets = ["@rules_rust//"]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::fs::read_to_string;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "cc-conflicts.toml";

/// Default header count above which the probe stops enumerating subsets.
pub const DEFAULT_MAX_EXHAUSTIVE_HEADERS: usize = 12;

/// Tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bazel invocation settings
    pub bazel: BazelConfig,

    /// Header probe settings
    pub probe: ProbeConfig,

    /// Target selection settings
    pub scan: ScanConfig,
}

/// How Bazel is invoked inside the scratch workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BazelConfig {
    /// Bazel (or bazelisk) executable. Looked up in PATH when unset.
    pub program: Option<PathBuf>,

    /// Arguments placed before the Bazel command (e.g. `--output_user_root`).
    pub startup_args: Vec<String>,

    /// Extra arguments for every `bazel build` invocation.
    pub build_args: Vec<String>,

    /// Point Bazel at the scanned registry instead of its default registry.
    pub use_local_registry: bool,
}

impl Default for BazelConfig {
    fn default() -> Self {
        BazelConfig {
            program: None,
            startup_args: Vec::new(),
            build_args: Vec::new(),
            use_local_registry: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Largest header set searched exhaustively; bigger sets use the
    /// greedy reduction.
    pub max_exhaustive_headers: usize,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        ProbeConfig {
            max_exhaustive_headers: DEFAULT_MAX_EXHAUSTIVE_HEADERS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Label prefixes dropped after target enumeration.
    pub exclude_targets: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path).context("failed to read config")?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load the explicit config file, or `cc-conflicts.toml` under `cwd` if
    /// it exists, or the defaults.
    ///
    /// An explicit path that cannot be read is an error; a discovered file
    /// is only used when present.
    pub fn discover(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        let candidate = cwd.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            tracing::debug!("Using config file {}", candidate.display());
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}
