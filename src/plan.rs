//! Combination planner.
//!
//! Every unordered k-combination of the probed targets becomes one synthetic
//! `cc_binary` that includes the reduced headers of all members and links
//! against all of them. Combinations are generated lexicographically by
//! discovery order and numbered densely from 0.

use crate::build::{translation_unit, SyntheticUnit};
use crate::core::{Combination, IndexCombinations, UnitId};
use crate::probe::ProbedTarget;

/// Plan all k-combinations of `targets`.
///
/// Fewer than two targets, or `k < 2`, plans nothing. `k` larger than the
/// number of targets is clamped.
pub fn plan(targets: &[ProbedTarget], k: usize) -> Vec<Combination> {
    if targets.len() < 2 || k < 2 {
        return Vec::new();
    }

    let k = if k > targets.len() {
        tracing::info!(
            "Combination size {} exceeds {} targets, using {}",
            k,
            targets.len(),
            targets.len()
        );
        targets.len()
    } else {
        k
    };

    IndexCombinations::new(targets.len(), k)
        .enumerate()
        .map(|(id, positions)| {
            let members: Vec<&ProbedTarget> = positions.iter().map(|&i| &targets[i]).collect();
            let source = translation_unit(members.iter().map(|m| (&m.target, &m.reduced)));
            Combination::new(
                UnitId(id),
                members.into_iter().map(|m| m.target.clone()).collect(),
                source,
            )
        })
        .collect()
}

/// Plan only the combinations that involve a target of `anchor`.
pub fn plan_anchored(targets: &[ProbedTarget], k: usize, anchor: &str) -> Vec<Combination> {
    let mut combinations: Vec<Combination> = plan(targets, k)
        .into_iter()
        .filter(|c| c.involves_module(anchor))
        .collect();

    for (id, combination) in combinations.iter_mut().enumerate() {
        combination.renumber(UnitId(id));
    }
    combinations
}

/// The synthetic build unit of a combination.
pub fn synthetic_unit(combination: &Combination) -> SyntheticUnit {
    SyntheticUnit {
        name: combination.id().target_name(),
        description: combination.description(),
        deps: combination.members().to_vec(),
        source: combination.source().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::core::{HeaderSet, LibraryTarget};

    fn probed(label: &str, headers: &[&str]) -> ProbedTarget {
        ProbedTarget::unreduced(LibraryTarget::new(label), HeaderSet::new(headers.iter().copied()))
    }

    fn abc() -> Vec<ProbedTarget> {
        vec![
            probed("@a//:a", &["a.h"]),
            probed("@b//:b", &["b.h"]),
            probed("@c//:c", &["c.h"]),
        ]
    }

    #[test]
    fn test_pairs_of_three() {
        let combinations = plan(&abc(), 2);
        let descriptions: Vec<String> = combinations.iter().map(Combination::description).collect();
        assert_eq!(
            descriptions,
            ["@a//:a + @b//:b", "@a//:a + @c//:c", "@b//:b + @c//:c"]
        );

        let ids: BTreeSet<UnitId> = combinations.iter().map(Combination::id).collect();
        assert_eq!(ids, BTreeSet::from([UnitId(0), UnitId(1), UnitId(2)]));
    }

    #[test]
    fn test_full_size_is_single_combination() {
        let combinations = plan(&abc(), 3);
        assert_eq!(combinations.len(), 1);
        assert_eq!(combinations[0].members().len(), 3);
    }

    #[test]
    fn test_oversized_k_is_clamped() {
        assert_eq!(plan(&abc(), 7), plan(&abc(), 3));
    }

    #[test]
    fn test_too_few_targets() {
        assert!(plan(&abc()[..1], 2).is_empty());
        assert!(plan(&[], 2).is_empty());
        assert!(plan(&abc(), 1).is_empty());
    }

    #[test]
    fn test_planning_is_deterministic() {
        let targets = abc();
        let first = plan(&targets, 2);
        let second = plan(&targets, 2);

        let first_sets: Vec<BTreeSet<&str>> = first.iter().map(Combination::member_set).collect();
        let second_sets: Vec<BTreeSet<&str>> = second.iter().map(Combination::member_set).collect();
        assert_eq!(first_sets, second_sets);
        assert!(first_sets.iter().all(|set| set.len() == 2));
    }

    #[test]
    fn test_empty_reduced_set_contributes_marker_only() {
        let mut targets = abc();
        targets[1].reduced = HeaderSet::default();

        let combinations = plan(&targets, 2);
        assert_eq!(
            combinations[0].source(),
            "// @a//:a\n#include \"a.h\"\n// @b//:b\n\nint main() {}\n"
        );
        assert_eq!(combinations[0].members()[1], LibraryTarget::new("@b//:b"));
    }

    #[test]
    fn test_anchored_plan_is_dense() {
        let combinations = plan_anchored(&abc(), 2, "c");
        let descriptions: Vec<String> = combinations.iter().map(Combination::description).collect();
        assert_eq!(descriptions, ["@a//:a + @c//:c", "@b//:b + @c//:c"]);
        assert_eq!(combinations[0].id(), UnitId(0));
        assert_eq!(combinations[1].id(), UnitId(1));
    }

    #[test]
    fn test_synthetic_unit() {
        let combinations = plan(&abc(), 2);
        let unit = synthetic_unit(&combinations[2]);

        assert_eq!(unit.name, "combo_2");
        assert_eq!(unit.description, "@b//:b + @c//:c");
        assert_eq!(
            unit.deps,
            vec![LibraryTarget::new("@b//:b"), LibraryTarget::new("@c//:c")]
        );
        assert!(unit.source.contains("#include \"b.h\"\n// @c//:c\n#include \"c.h\"\n"));
    }
}
