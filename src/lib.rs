//! cc-conflicts - find C/C++ libraries that cannot be used together
//!
//! This crate scans modules of a Bazel registry for public `cc_library`
//! targets that fail to compile or link when combined in one binary,
//! including header probing, combination planning, and result reporting.

pub mod build;
pub mod core;
pub mod ops;
pub mod plan;
pub mod probe;
pub mod registry;
pub mod report;
pub mod util;
pub mod workspace;

/// Test utilities and mocks for unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a scripted build system, registry fixtures
/// and a fake `bazel` executable.
#[cfg(test)]
pub mod test_support;

pub use core::{BuildStatus, Combination, HeaderSet, LibraryTarget, TargetBuildResult, UnitId};
pub use ops::scan::{scan, ScanError, ScanOptions};
pub use registry::{LocalRegistry, ModuleVersion, Registry};
pub use report::ScanReport;
