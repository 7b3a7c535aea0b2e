//! Header probe and reducer.
//!
//! Before a library takes part in any combination, its declared public
//! headers are compiled on their own against the library. Libraries whose
//! headers only build with flags missing from the scratch workspace would
//! otherwise turn every combination they are in into a false positive.
//!
//! The probe looks for the largest subset of headers that compiles:
//!
//! 1. All headers at once. This is the common case and costs one build.
//! 2. Otherwise every subset of size `n - 1`, then `n - 2`, down to 1, in
//!    lexicographic order of header positions. The first subset that
//!    compiles at the largest size wins. All subsets of one size are handed
//!    to the build system as a single build.
//! 3. Nothing compiles: the library keeps an empty header set and is only
//!    tested for link conflicts.
//!
//! Header sets larger than the exhaustive limit use a greedy reduction
//! instead: headers that compile alone are added one by one, in order,
//! while the accumulated set keeps compiling.

use std::collections::HashMap;

use anyhow::Result;

use crate::build::{translation_unit, BuildSystem, SyntheticUnit};
use crate::core::{HeaderSet, IndexCombinations, LibraryTarget};
use crate::util::diagnostic::{Diagnostic, Diagnostics};
use crate::util::process::ProcessError;

/// Whether a header query failed for the target itself rather than because
/// Bazel could not be run.
fn is_target_failure(err: &anyhow::Error) -> bool {
    err.downcast_ref::<ProcessError>().is_some() || err.downcast_ref::<serde_json::Error>().is_some()
}

/// A library target together with its declared and usable headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedTarget {
    pub target: LibraryTarget,
    /// Headers declared by the target's public interface
    pub declared: HeaderSet,
    /// Headers that compile standalone; a subset of `declared`
    pub reduced: HeaderSet,
}

impl ProbedTarget {
    /// A target whose headers were not probed and are used as declared.
    pub fn unreduced(target: LibraryTarget, headers: HeaderSet) -> Self {
        ProbedTarget {
            target,
            declared: headers.clone(),
            reduced: headers,
        }
    }

    /// Whether some declared headers were dropped.
    pub fn is_reduced(&self) -> bool {
        self.reduced.len() != self.declared.len()
    }

    pub fn dropped_headers(&self) -> Vec<&str> {
        self.declared.dropped_from(&self.reduced)
    }
}

/// Runs header probes through a build system.
pub struct HeaderProbe<'a, B: BuildSystem + ?Sized> {
    build: &'a mut B,
    max_exhaustive_headers: usize,
    next_unit: usize,
}

impl<'a, B: BuildSystem + ?Sized> HeaderProbe<'a, B> {
    pub fn new(build: &'a mut B, max_exhaustive_headers: usize) -> Self {
        HeaderProbe {
            build,
            max_exhaustive_headers,
            next_unit: 0,
        }
    }

    /// Query the target's headers and reduce them to a compiling subset.
    ///
    /// Dropped headers and failed header queries are reported through
    /// `diagnostics`; only failures to run the build system are errors.
    pub fn probe(
        &mut self,
        target: &LibraryTarget,
        diagnostics: &mut Diagnostics,
    ) -> Result<ProbedTarget> {
        let declared = match self.build.public_headers(target) {
            Ok(headers) => headers,
            Err(err) if is_target_failure(&err) => {
                tracing::warn!("Header query for {} failed: {:#}", target, err);
                diagnostics.push(
                    Diagnostic::warning(format!(
                        "could not query public headers of `{}`; it is only tested for link conflicts",
                        target
                    ))
                    .with_context(format!("{:#}", err)),
                );
                return Ok(ProbedTarget::unreduced(target.clone(), HeaderSet::default()));
            }
            Err(err) => return Err(err),
        };
        tracing::debug!("{} declares {} public headers", target, declared.len());

        let reduced = self.reduce(target, &declared, diagnostics)?;
        let probed = ProbedTarget {
            target: target.clone(),
            declared,
            reduced,
        };

        if probed.reduced.is_empty() && !probed.declared.is_empty() {
            diagnostics.push(
                Diagnostic::warning(format!(
                    "no public header of `{}` compiles on its own; it is only tested for link conflicts",
                    target
                ))
                .with_context(format!("dropped {}", probed.dropped_headers().join(", "))),
            );
        } else if probed.is_reduced() {
            diagnostics.push(
                Diagnostic::warning(format!("reduced header set for `{}`", target))
                    .with_context(format!("dropped {}", probed.dropped_headers().join(", "))),
            );
        }

        Ok(probed)
    }

    fn reduce(
        &mut self,
        target: &LibraryTarget,
        declared: &HeaderSet,
        diagnostics: &mut Diagnostics,
    ) -> Result<HeaderSet> {
        if declared.is_empty() {
            return Ok(HeaderSet::default());
        }

        let all: Vec<usize> = (0..declared.len()).collect();
        if self.compiles(target, declared, &[all])?[0] {
            return Ok(declared.clone());
        }

        tracing::info!("Headers of {} do not compile together, reducing", target);

        if declared.len() > self.max_exhaustive_headers {
            diagnostics.push(Diagnostic::note(format!(
                "`{}` declares {} headers (limit {}); used greedy reduction, the result may not be the largest compiling subset",
                target,
                declared.len(),
                self.max_exhaustive_headers
            )));
            return self.reduce_greedy(target, declared);
        }

        self.reduce_exhaustive(target, declared)
    }

    fn reduce_exhaustive(&mut self, target: &LibraryTarget, declared: &HeaderSet) -> Result<HeaderSet> {
        for size in (1..declared.len()).rev() {
            let subsets: Vec<Vec<usize>> = IndexCombinations::new(declared.len(), size).collect();
            tracing::debug!("Trying {} subsets of {} headers for {}", subsets.len(), size, target);

            let outcomes = self.compiles(target, declared, &subsets)?;
            if let Some(winner) = outcomes.iter().position(|ok| *ok) {
                return Ok(declared.select(&subsets[winner]));
            }
        }

        Ok(HeaderSet::default())
    }

    fn reduce_greedy(&mut self, target: &LibraryTarget, declared: &HeaderSet) -> Result<HeaderSet> {
        let singles: Vec<Vec<usize>> = (0..declared.len()).map(|i| vec![i]).collect();
        let alone = self.compiles(target, declared, &singles)?;

        let mut accepted: Vec<usize> = Vec::new();
        for (position, compiles_alone) in alone.into_iter().enumerate() {
            if !compiles_alone {
                continue;
            }
            let mut candidate = accepted.clone();
            candidate.push(position);
            if accepted.is_empty() || self.compiles(target, declared, &[candidate.clone()])?[0] {
                accepted = candidate;
            }
        }

        Ok(declared.select(&accepted))
    }

    /// Build one probe unit per subset; one outcome per subset, in order.
    fn compiles(
        &mut self,
        target: &LibraryTarget,
        declared: &HeaderSet,
        subsets: &[Vec<usize>],
    ) -> Result<Vec<bool>> {
        let units: Vec<SyntheticUnit> = subsets
            .iter()
            .map(|subset| self.probe_unit(target, &declared.select(subset), declared.len()))
            .collect();

        let outcomes: HashMap<String, bool> = self
            .build
            .run_build(&units)?
            .into_iter()
            .map(|event| (event.unit, event.success))
            .collect();

        Ok(units
            .iter()
            .map(|unit| match outcomes.get(&unit.name) {
                Some(&success) => success,
                None => {
                    tracing::warn!("no completion event for probe unit {}", unit.name);
                    false
                }
            })
            .collect())
    }

    fn probe_unit(&mut self, target: &LibraryTarget, headers: &HeaderSet, declared: usize) -> SyntheticUnit {
        let name = format!("probe_{}", self.next_unit);
        self.next_unit += 1;

        SyntheticUnit {
            name,
            description: format!("{} ({}/{} headers)", target, headers.len(), declared),
            deps: vec![target.clone()],
            source: translation_unit([(target, headers)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockBuild;
    use crate::util::diagnostic::Severity;

    fn probe_with(build: &mut MockBuild, label: &str) -> (ProbedTarget, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let probed = HeaderProbe::new(build, 12)
            .probe(&LibraryTarget::new(label), &mut diagnostics)
            .unwrap();
        (probed, diagnostics)
    }

    #[test]
    fn test_full_set_compiles() {
        let mut build = MockBuild::new().target("@foo//:lib", &["foo/a.h", "foo/b.h"]);

        let (probed, diagnostics) = probe_with(&mut build, "@foo//:lib");
        assert_eq!(probed.reduced, probed.declared);
        assert!(!probed.is_reduced());
        assert!(diagnostics.is_empty());
        assert_eq!(build.invocations().len(), 1);
    }

    #[test]
    fn test_single_broken_header_dropped() {
        let mut build = MockBuild::new()
            .target("@foo//:lib", &["a.h", "b.h", "broken.h", "d.h"])
            .fail_when_including(&["broken.h"]);

        let (probed, diagnostics) = probe_with(&mut build, "@foo//:lib");
        assert_eq!(probed.reduced.headers(), ["a.h", "b.h", "d.h"]);
        assert_eq!(probed.dropped_headers(), ["broken.h"]);

        assert_eq!(diagnostics.len(), 1);
        let warning = diagnostics.iter().next().unwrap();
        assert_eq!(warning.severity, Severity::Warning);
        assert!(warning.message.contains("@foo//:lib"));
        assert_eq!(warning.context, ["dropped broken.h"]);
    }

    #[test]
    fn test_nothing_compiles() {
        let mut build = MockBuild::new()
            .target("@foo//:lib", &["a.h", "b.h"])
            .fail_when_including(&["a.h"])
            .fail_when_including(&["b.h"]);

        let (probed, diagnostics) = probe_with(&mut build, "@foo//:lib");
        assert!(probed.reduced.is_empty());
        assert_eq!(diagnostics.warning_count(), 1);
        assert!(diagnostics
            .iter()
            .next()
            .unwrap()
            .message
            .contains("only tested for link conflicts"));
    }

    #[test]
    fn test_failed_header_query_is_a_warning() {
        let mut build = MockBuild::new()
            .target("@foo//:lib", &["foo.h"])
            .fail_header_query("@foo//:lib");

        let (probed, diagnostics) = probe_with(&mut build, "@foo//:lib");
        assert!(probed.declared.is_empty());
        assert!(probed.reduced.is_empty());
        assert!(build.invocations().is_empty());

        assert_eq!(diagnostics.warning_count(), 1);
        let warning = diagnostics.iter().next().unwrap();
        assert!(warning.message.contains("could not query public headers of `@foo//:lib`"));
        assert!(warning.context[0].contains("exit code Some(1)"));
    }

    #[test]
    fn test_other_header_query_errors_are_fatal() {
        let mut build = MockBuild::new();
        let mut diagnostics = Diagnostics::new();

        let err = HeaderProbe::new(&mut build, 12)
            .probe(&LibraryTarget::new("@foo//:lib"), &mut diagnostics)
            .unwrap_err();
        assert!(err.to_string().contains("unknown target"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_pair_failing_together_keeps_first() {
        let mut build = MockBuild::new()
            .target("@foo//:lib", &["a.h", "b.h"])
            .fail_when_including(&["a.h", "b.h"]);

        let (probed, diagnostics) = probe_with(&mut build, "@foo//:lib");
        assert_eq!(probed.reduced.headers(), ["a.h"]);
        assert_eq!(diagnostics.iter().next().unwrap().context, ["dropped b.h"]);
    }

    #[test]
    fn test_largest_tier_wins_over_earlier_smaller() {
        // {a,b} and {a,c} conflict; {b,c} is the only compiling pair.
        let mut build = MockBuild::new()
            .target("@foo//:lib", &["a.h", "b.h", "c.h"])
            .fail_when_including(&["a.h", "b.h"])
            .fail_when_including(&["a.h", "c.h"]);

        let (probed, _) = probe_with(&mut build, "@foo//:lib");
        assert_eq!(probed.reduced.headers(), ["b.h", "c.h"]);
        // full set, then one batch of pairs
        assert_eq!(build.invocations().len(), 2);
        assert_eq!(build.invocations()[1].len(), 3);
    }

    #[test]
    fn test_no_headers_skips_build() {
        let mut build = MockBuild::new().target("@foo//:lib", &[]);

        let (probed, diagnostics) = probe_with(&mut build, "@foo//:lib");
        assert!(probed.reduced.is_empty());
        assert!(diagnostics.is_empty());
        assert!(build.invocations().is_empty());
    }

    #[test]
    fn test_missing_event_counts_as_failure() {
        let mut build = MockBuild::new()
            .target("@foo//:lib", &["a.h", "b.h"])
            .fail_when_including(&["a.h", "b.h"])
            .drop_events_for("probe_1");

        // probe_1 is {a.h}; without its event {b.h} wins
        let (probed, _) = probe_with(&mut build, "@foo//:lib");
        assert_eq!(probed.reduced.headers(), ["b.h"]);
    }

    #[test]
    fn test_greedy_reduction_above_limit() {
        let mut build = MockBuild::new()
            .target("@foo//:lib", &["a.h", "b.h", "c.h", "d.h"])
            .fail_when_including(&["c.h"])
            .fail_when_including(&["a.h", "d.h"]);

        let mut diagnostics = Diagnostics::new();
        let probed = HeaderProbe::new(&mut build, 3)
            .probe(&LibraryTarget::new("@foo//:lib"), &mut diagnostics)
            .unwrap();

        assert_eq!(probed.reduced.headers(), ["a.h", "b.h"]);
        assert_eq!(diagnostics.len(), 2);
        assert!(diagnostics.iter().any(|d| d.severity == Severity::Note));
        assert_eq!(diagnostics.warning_count(), 1);
    }

    #[test]
    fn test_probe_units_link_against_target() {
        let mut build = MockBuild::new().target("@foo//:lib", &["foo.h"]);
        probe_with(&mut build, "@foo//:lib");

        let unit = &build.invocations()[0][0];
        assert_eq!(unit.name, "probe_0");
        assert_eq!(unit.deps, vec![LibraryTarget::new("@foo//:lib")]);
        assert!(unit.source.contains("// @foo//:lib\n#include \"foo.h\"\n"));
    }
}
