//! High-level operations.
//!
//! This module contains the implementation of cc-conflicts commands.

pub mod scan;

pub use scan::{
    check_conflicts, enumerate_targets, scan, ModuleSpec, ScanError, ScanOptions, ScanSettings,
};
