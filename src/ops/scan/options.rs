//! Scan inputs.

use std::path::PathBuf;

use crate::registry::ModuleVersion;
use crate::util::config::{Config, DEFAULT_MAX_EXHAUSTIVE_HEADERS};

/// A module named on the command line, optionally pinned (`name@version`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    pub name: String,
    pub version: Option<ModuleVersion>,
}

impl ModuleSpec {
    pub fn new(name: impl Into<String>) -> Self {
        ModuleSpec {
            name: name.into(),
            version: None,
        }
    }

    pub fn pinned(name: impl Into<String>, version: impl Into<ModuleVersion>) -> Self {
        ModuleSpec {
            name: name.into(),
            version: Some(version.into()),
        }
    }
}

impl std::str::FromStr for ModuleSpec {
    type Err = ModuleSpecParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('@') {
            None if !s.is_empty() => Ok(ModuleSpec::new(s)),
            Some((name, version)) if !name.is_empty() && !version.is_empty() => {
                Ok(ModuleSpec::pinned(name, version))
            }
            _ => Err(ModuleSpecParseError(s.to_string())),
        }
    }
}

impl std::fmt::Display for ModuleSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Error parsing a module argument.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid module '{0}', expected `name` or `name@version`")]
pub struct ModuleSpecParseError(pub String);

/// Everything a scan needs, after CLI and config file are merged.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub modules: Vec<ModuleSpec>,

    /// Registry checkout containing `modules/`
    pub registry: PathBuf,

    /// Requested combination size (`-k`); defaults to the module count
    pub combination_size: Option<usize>,

    /// Only test combinations involving this module
    pub anchor: Option<String>,

    /// Bazel launcher; overrides `[bazel] program`
    pub bazel: Option<PathBuf>,

    /// Leave the scratch workspace behind after a completed scan
    pub keep_workspace: bool,

    pub config: Config,
}

impl ScanOptions {
    pub fn new(modules: Vec<ModuleSpec>, registry: impl Into<PathBuf>) -> Self {
        ScanOptions {
            modules,
            registry: registry.into(),
            combination_size: None,
            anchor: None,
            bazel: None,
            keep_workspace: false,
            config: Config::default(),
        }
    }

    pub fn module_names(&self) -> Vec<String> {
        self.modules.iter().map(|m| m.name.clone()).collect()
    }
}

/// Validated settings of the conflict-checking stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    /// Number of targets per combination, at least 2
    pub combination_size: usize,
    pub anchor: Option<String>,
    pub max_exhaustive_headers: usize,
    /// Label prefixes dropped after enumeration
    pub exclude_targets: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        ScanSettings {
            combination_size: 2,
            anchor: None,
            max_exhaustive_headers: DEFAULT_MAX_EXHAUSTIVE_HEADERS,
            exclude_targets: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_spec_parse() {
        assert_eq!("zlib".parse::<ModuleSpec>().unwrap(), ModuleSpec::new("zlib"));
        assert_eq!(
            "fmt@10.2.1".parse::<ModuleSpec>().unwrap(),
            ModuleSpec::pinned("fmt", "10.2.1")
        );
        assert_eq!("fmt@10.2.1".parse::<ModuleSpec>().unwrap().to_string(), "fmt@10.2.1");
    }

    #[test]
    fn test_module_spec_rejects_empty_parts() {
        for bad in ["", "@1.0", "fmt@"] {
            assert!(bad.parse::<ModuleSpec>().is_err(), "accepted {:?}", bad);
        }
    }
}
