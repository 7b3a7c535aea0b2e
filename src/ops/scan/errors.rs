//! User-facing configuration errors of a scan.
//!
//! All of these are raised before Bazel is first invoked.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::registry::RegistryError;

#[derive(Debug, Error, MietteDiagnostic)]
pub enum ScanError {
    #[error(transparent)]
    #[diagnostic(
        code(cc_conflicts::registry::not_a_registry),
        help("Point `--registry` at a registry checkout containing `modules/`")
    )]
    Registry(#[from] RegistryError),

    #[error("module `{module}` not found in registry `{}`", .registry.display())]
    #[diagnostic(code(cc_conflicts::scan::unknown_module))]
    UnknownModule {
        module: String,
        registry: PathBuf,
        #[help]
        advice: String,
    },

    #[error("version `{version}` not found for module `{module}`")]
    #[diagnostic(code(cc_conflicts::scan::unknown_version))]
    UnknownVersion {
        module: String,
        version: String,
        #[help]
        advice: String,
    },

    #[error("version `{version}` of module `{module}` is yanked: {reason}")]
    #[diagnostic(code(cc_conflicts::scan::yanked_version))]
    YankedVersion {
        module: String,
        version: String,
        reason: String,
        #[help]
        advice: String,
    },

    #[error("every version of module `{module}` is yanked")]
    #[diagnostic(
        code(cc_conflicts::scan::all_yanked),
        help("Pin a version explicitly only after checking why it was yanked")
    )]
    AllYanked { module: String },

    #[error("failed to read metadata of module `{module}`: {reason}")]
    #[diagnostic(code(cc_conflicts::registry::unreadable))]
    UnreadableMetadata { module: String, reason: String },

    #[error("failed to list modules of registry `{}`: {reason}", .registry.display())]
    #[diagnostic(code(cc_conflicts::registry::unreadable))]
    UnreadableRegistry { registry: PathBuf, reason: String },

    #[error("module `{module}` is given more than once")]
    #[diagnostic(code(cc_conflicts::scan::duplicate_module))]
    DuplicateModule { module: String },

    #[error("invalid combination size {size}")]
    #[diagnostic(
        code(cc_conflicts::scan::combination_size),
        help("Conflicts need at least two libraries; use `-k 2` or larger")
    )]
    InvalidCombinationSize { size: usize },

    #[error("anchor module `{anchor}` is not among the scanned modules")]
    #[diagnostic(code(cc_conflicts::scan::anchor))]
    AnchorNotScanned {
        anchor: String,
        #[help]
        advice: String,
    },

    #[error("bazel executable `{}` not found", .path.display())]
    #[diagnostic(
        code(cc_conflicts::bazel::missing),
        help("Check the `--bazel` flag, `CC_CONFLICTS_BAZEL` or `[bazel] program`")
    )]
    BazelMissing { path: PathBuf },

    #[error("neither `bazelisk` nor `bazel` found in PATH")]
    #[diagnostic(
        code(cc_conflicts::bazel::not_found),
        help("Install bazelisk, or pass the launcher with `--bazel <PATH>`")
    )]
    BazelNotFound,
}

impl ScanError {
    pub(crate) fn unknown_module(module: &str, registry: PathBuf, possible: &[String]) -> Self {
        ScanError::UnknownModule {
            module: module.to_string(),
            registry,
            advice: format!("Possible modules: {}", possible.join(", ")),
        }
    }
}
