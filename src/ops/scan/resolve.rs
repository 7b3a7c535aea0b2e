//! Input validation: module versions, combination size, Bazel launcher.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::errors::ScanError;
use super::options::ModuleSpec;
use crate::registry::{ModuleVersion, Registry};
use crate::util::process::{find_bazel, find_executable};
use crate::workspace::ModuleDep;

/// Pick a version for every requested module.
///
/// Unpinned modules get their newest non-yanked version. A pinned version
/// must be listed in the registry and must not be yanked.
pub fn resolve_modules(
    registry: &dyn Registry,
    registry_path: &Path,
    specs: &[ModuleSpec],
) -> Result<Vec<ModuleDep>, ScanError> {
    let mut seen = HashSet::new();
    let mut deps = Vec::with_capacity(specs.len());

    for spec in specs {
        if !seen.insert(spec.name.as_str()) {
            return Err(ScanError::DuplicateModule {
                module: spec.name.clone(),
            });
        }

        if !registry.contains(&spec.name, None) {
            let possible = registry.all_modules().map_err(|e| ScanError::UnreadableRegistry {
                registry: registry_path.to_path_buf(),
                reason: format!("{:#}", e),
            })?;
            return Err(ScanError::unknown_module(
                &spec.name,
                registry_path.to_path_buf(),
                &possible,
            ));
        }

        let unreadable = |e: anyhow::Error| ScanError::UnreadableMetadata {
            module: spec.name.clone(),
            reason: format!("{:#}", e),
        };
        let available = registry
            .module_versions(&spec.name, false)
            .map_err(unreadable)?;

        let version = match &spec.version {
            Some(pinned) => check_pinned(registry, spec, pinned, &available)?,
            None => available
                .last()
                .cloned()
                .ok_or_else(|| ScanError::AllYanked {
                    module: spec.name.clone(),
                })?,
        };

        tracing::debug!("Resolved {} to {}", spec.name, version);
        deps.push(ModuleDep::new(spec.name.clone(), version));
    }

    Ok(deps)
}

fn check_pinned(
    registry: &dyn Registry,
    spec: &ModuleSpec,
    pinned: &ModuleVersion,
    available: &[ModuleVersion],
) -> Result<ModuleVersion, ScanError> {
    let advice = format!("Possible versions: {}", join_versions(available));

    if !registry.contains(&spec.name, Some(pinned)) {
        return Err(ScanError::UnknownVersion {
            module: spec.name.clone(),
            version: pinned.to_string(),
            advice,
        });
    }

    let reason = registry
        .yank_reason(&spec.name, pinned)
        .map_err(|e| ScanError::UnreadableMetadata {
            module: spec.name.clone(),
            reason: format!("{:#}", e),
        })?;
    if let Some(reason) = reason {
        return Err(ScanError::YankedVersion {
            module: spec.name.clone(),
            version: pinned.to_string(),
            reason,
            advice,
        });
    }

    Ok(pinned.clone())
}

fn join_versions(versions: &[ModuleVersion]) -> String {
    if versions.is_empty() {
        return "none (every version is yanked)".to_string();
    }
    versions
        .iter()
        .map(ModuleVersion::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Combination size to plan with.
///
/// Defaults to the number of modules, and to 2 for a single module.
pub fn effective_combination_size(
    requested: Option<usize>,
    module_count: usize,
) -> Result<usize, ScanError> {
    let size = requested.unwrap_or_else(|| module_count.max(2));
    if size < 2 {
        return Err(ScanError::InvalidCombinationSize { size });
    }
    Ok(size)
}

/// The anchor must be one of the scanned modules.
pub fn check_anchor(anchor: Option<&str>, modules: &[String]) -> Result<(), ScanError> {
    match anchor {
        Some(anchor) if !modules.iter().any(|m| m == anchor) => Err(ScanError::AnchorNotScanned {
            anchor: anchor.to_string(),
            advice: format!("Scanned modules: {}", modules.join(", ")),
        }),
        _ => Ok(()),
    }
}

/// Locate the Bazel launcher.
///
/// An explicit program is used as a path if it exists, and looked up in
/// PATH otherwise. Without one, `bazelisk` and then `bazel` are searched.
pub fn resolve_bazel(explicit: Option<&Path>) -> Result<PathBuf, ScanError> {
    match explicit {
        Some(path) if path.is_file() => Ok(path.to_path_buf()),
        Some(path) => path
            .to_str()
            .and_then(find_executable)
            .ok_or_else(|| ScanError::BazelMissing {
                path: path.to_path_buf(),
            }),
        None => find_bazel().ok_or(ScanError::BazelNotFound),
    }
}
