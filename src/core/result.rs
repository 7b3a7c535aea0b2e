//! Per-combination build results.

use std::fmt;

use serde::Serialize;

use super::combination::{Combination, UnitId};

/// Outcome of a combination's synthetic unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    /// No completion event observed yet
    Pending,
    /// Compiled and linked
    Success,
    /// Failed to compile or link
    Failure,
}

impl BuildStatus {
    pub fn from_success(success: bool) -> Self {
        if success {
            BuildStatus::Success
        } else {
            BuildStatus::Failure
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildStatus::Pending => write!(f, "pending"),
            BuildStatus::Success => write!(f, "success"),
            BuildStatus::Failure => write!(f, "failure"),
        }
    }
}

/// Result record of one combination.
///
/// Starts out [`BuildStatus::Pending`] and is settled at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetBuildResult {
    id: UnitId,
    description: String,
    status: BuildStatus,
}

impl TargetBuildResult {
    pub fn pending(combination: &Combination) -> Self {
        TargetBuildResult {
            id: combination.id(),
            description: combination.description(),
            status: BuildStatus::Pending,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn status(&self) -> BuildStatus {
        self.status
    }

    /// Settle the result.
    ///
    /// Returns the already-recorded status, unchanged, if the result was
    /// settled before.
    pub fn settle(&mut self, success: bool) -> Result<(), BuildStatus> {
        if self.status != BuildStatus::Pending {
            return Err(self.status);
        }
        self.status = BuildStatus::from_success(success);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LibraryTarget;

    fn combo() -> Combination {
        Combination::new(
            UnitId(0),
            vec![LibraryTarget::new("@a//:a"), LibraryTarget::new("@b//:b")],
            String::new(),
        )
    }

    #[test]
    fn test_settles_once() {
        let mut result = TargetBuildResult::pending(&combo());
        assert_eq!(result.status(), BuildStatus::Pending);
        assert_eq!(result.description(), "@a//:a + @b//:b");

        result.settle(false).unwrap();
        assert_eq!(result.status(), BuildStatus::Failure);

        assert_eq!(result.settle(true), Err(BuildStatus::Failure));
        assert_eq!(result.status(), BuildStatus::Failure);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&BuildStatus::Success).unwrap();
        assert_eq!(json, "\"success\"");
    }
}
