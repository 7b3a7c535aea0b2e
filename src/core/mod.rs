//! Core data structures.
//!
//! - Library targets and header sets discovered in the scratch workspace
//! - Combinations of targets and their synthetic unit identities
//! - Per-combination build results

pub mod combination;
pub mod library;
pub mod result;

pub use combination::{Combination, IndexCombinations, UnitId};
pub use library::{HeaderSet, LibraryTarget};
pub use result::{BuildStatus, TargetBuildResult};
