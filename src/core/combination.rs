//! Combinations of library targets and their synthetic unit identities.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use super::library::LibraryTarget;

/// Dense identity of a planned combination.
///
/// Doubles as the Bazel target name of the synthetic unit and as the key
/// that correlates completion events back to the combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UnitId(pub usize);

impl UnitId {
    /// Synthetic target name in the scratch workspace.
    pub fn target_name(&self) -> String {
        format!("combo_{}", self.0)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "combo_{}", self.0)
    }
}

/// A group of distinct library targets tested together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combination {
    id: UnitId,
    members: Vec<LibraryTarget>,
    source: String,
}

impl Combination {
    /// `source` is the translation unit compiled for this combination.
    pub fn new(id: UnitId, members: Vec<LibraryTarget>, source: String) -> Self {
        Combination {
            id,
            members,
            source,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn members(&self) -> &[LibraryTarget] {
        &self.members
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Human-readable `A + B [+ C...]` form.
    pub fn description(&self) -> String {
        self.members
            .iter()
            .map(LibraryTarget::label)
            .collect::<Vec<_>>()
            .join(" + ")
    }

    /// Member labels as an order-insensitive set.
    pub fn member_set(&self) -> BTreeSet<&str> {
        self.members.iter().map(LibraryTarget::label).collect()
    }

    pub fn involves_module(&self, module: &str) -> bool {
        self.members.iter().any(|m| m.belongs_to(module))
    }

    pub(crate) fn renumber(&mut self, id: UnitId) {
        self.id = id;
    }
}

/// Lexicographic k-subsets of the positions `0..n`.
///
/// `IndexCombinations::new(4, 2)` yields `[0,1] [0,2] [0,3] [1,2] [1,3] [2,3]`.
/// Nothing is yielded when `k == 0` or `k > n`.
#[derive(Debug, Clone)]
pub struct IndexCombinations {
    n: usize,
    next: Option<Vec<usize>>,
}

impl IndexCombinations {
    pub fn new(n: usize, k: usize) -> Self {
        let next = (k > 0 && k <= n).then(|| (0..k).collect());
        IndexCombinations { n, next }
    }
}

impl Iterator for IndexCombinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next.take()?;
        let k = current.len();

        // Rightmost position that can still move right.
        let pivot = (0..k).rev().find(|&i| current[i] < self.n - k + i);
        if let Some(i) = pivot {
            let mut advanced = current.clone();
            advanced[i] += 1;
            for j in i + 1..k {
                advanced[j] = advanced[j - 1] + 1;
            }
            self.next = Some(advanced);
        }

        Some(current)
    }
}
