//! Registry client - module metadata from a Bazel registry checkout.
//!
//! # Registry Structure
//!
//! ```text
//! registry/
//! ├── bazel_registry.json
//! └── modules/
//!     ├── zlib/
//!     │   ├── metadata.json      # versions + yanked_versions
//!     │   └── 1.3.1/
//!     │       └── MODULE.bazel
//!     └── fmt/
//!         └── metadata.json
//! ```
//!
//! Only `metadata.json` is read:
//!
//! ```json
//! {
//!   "versions": ["1.2.13", "1.3.1"],
//!   "yanked_versions": { "1.2.13": "CVE-2022-37434" }
//! }
//! ```

mod version;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

use crate::util::fs::read_to_string;

pub use version::ModuleVersion;

/// Read access to registry module metadata.
pub trait Registry {
    /// Whether the module exists, and if a version is given, whether it is
    /// listed for that module (yanked or not).
    fn contains(&self, module: &str, version: Option<&ModuleVersion>) -> bool;

    /// All module names, sorted.
    fn all_modules(&self) -> Result<Vec<String>>;

    /// Versions of a module in ascending order.
    fn module_versions(&self, module: &str, include_yanked: bool) -> Result<Vec<ModuleVersion>>;

    /// Yank reason for a version, if it is yanked.
    fn yank_reason(&self, module: &str, version: &ModuleVersion) -> Result<Option<String>>;
}

/// Errors opening a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("`{}` is not a registry (missing `modules/` directory)", .path.display())]
    NotARegistry { path: PathBuf },
}

/// Contents of `modules/<name>/metadata.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleMetadata {
    #[serde(default)]
    pub versions: Vec<ModuleVersion>,

    /// Version → reason
    #[serde(default)]
    pub yanked_versions: BTreeMap<String, String>,
}

impl ModuleMetadata {
    pub fn is_yanked(&self, version: &ModuleVersion) -> bool {
        self.yanked_reason(version).is_some()
    }

    fn yanked_reason(&self, version: &ModuleVersion) -> Option<&str> {
        self.yanked_versions
            .iter()
            .find(|(yanked, _)| ModuleVersion::from(yanked.as_str()) == *version)
            .map(|(_, reason)| reason.as_str())
    }
}

/// A registry checked out on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalRegistry {
    root: PathBuf,
}

impl LocalRegistry {
    /// Open a registry checkout rooted at `root`.
    pub fn open(root: &Path) -> Result<Self, RegistryError> {
        if !root.join("modules").is_dir() {
            return Err(RegistryError::NotARegistry {
                path: root.to_path_buf(),
            });
        }

        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        tracing::debug!("Opened registry at {}", root.display());
        Ok(LocalRegistry { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn metadata_path(&self, module: &str) -> PathBuf {
        self.root.join("modules").join(module).join("metadata.json")
    }

    /// Load and parse a module's metadata.
    pub fn metadata(&self, module: &str) -> Result<ModuleMetadata> {
        let path = self.metadata_path(module);
        let contents = read_to_string(&path).context("failed to read module metadata")?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse module metadata: {}", path.display()))
    }
}

impl Registry for LocalRegistry {
    fn contains(&self, module: &str, version: Option<&ModuleVersion>) -> bool {
        if module.is_empty() || module.contains(['/', '\\']) {
            return false;
        }
        match version {
            None => self.metadata_path(module).is_file(),
            Some(version) => self
                .metadata(module)
                .map(|meta| meta.versions.contains(version))
                .unwrap_or(false),
        }
    }

    fn all_modules(&self) -> Result<Vec<String>> {
        let modules_dir = self.root.join("modules");
        let mut modules = Vec::new();

        for entry in std::fs::read_dir(&modules_dir)
            .with_context(|| format!("failed to read directory: {}", modules_dir.display()))?
        {
            let entry = entry?;
            if !entry.path().join("metadata.json").is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                modules.push(name.to_string());
            }
        }

        modules.sort();
        Ok(modules)
    }

    fn module_versions(&self, module: &str, include_yanked: bool) -> Result<Vec<ModuleVersion>> {
        let meta = self.metadata(module)?;
        let mut versions: Vec<ModuleVersion> = meta
            .versions
            .iter()
            .filter(|v| include_yanked || !meta.is_yanked(v))
            .cloned()
            .collect();
        versions.sort();
        Ok(versions)
    }

    fn yank_reason(&self, module: &str, version: &ModuleVersion) -> Result<Option<String>> {
        let meta = self.metadata(module)?;
        Ok(meta.yanked_reason(version).map(str::to_string))
    }
}
