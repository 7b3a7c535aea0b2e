//! Test utilities and mocks for unit tests.
//!
//! [`MockBuild`] stands in for Bazel: it answers target and header queries
//! from a fixed table and decides each synthetic unit's outcome from the
//! headers its source includes.
//!
//! ```rust,ignore
//! let mut build = MockBuild::new()
//!     .target("@foo//:lib", &["foo.h", "broken.h"])
//!     .fail_when_including(&["broken.h"]);
//! ```

pub mod fixtures;

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};

use crate::build::{BuildRunner, CompletionEvent, SyntheticUnit, TargetQuery};
use crate::core::{HeaderSet, LibraryTarget};
use crate::util::process::ProcessError;

pub use fixtures::*;

/// Header paths included by a generated translation unit.
pub fn included_headers(source: &str) -> Vec<&str> {
    source
        .lines()
        .filter_map(|line| line.strip_prefix("#include \""))
        .filter_map(|rest| rest.strip_suffix('"'))
        .collect()
}

/// Scripted build system.
#[derive(Debug, Default)]
pub struct MockBuild {
    targets: Vec<LibraryTarget>,
    headers: HashMap<String, HeaderSet>,
    /// A unit fails when it includes every header of one rule.
    failing_includes: Vec<Vec<String>>,
    /// A unit fails when it depends on every label of one rule.
    failing_deps: Vec<Vec<String>>,
    dropped_events: HashSet<String>,
    failing_header_queries: HashSet<String>,
    extra_events: Vec<CompletionEvent>,
    repeat_events: bool,
    fail_invocations: bool,
    queried_modules: Vec<Vec<String>>,
    invocations: Vec<Vec<SyntheticUnit>>,
}

impl MockBuild {
    pub fn new() -> Self {
        MockBuild::default()
    }

    /// Register a public library and its declared headers.
    pub fn target(mut self, label: &str, headers: &[&str]) -> Self {
        self.targets.push(LibraryTarget::new(label));
        self.headers
            .insert(label.to_string(), HeaderSet::new(headers.iter().copied()));
        self
    }

    /// Fail any unit that includes all of `headers`.
    pub fn fail_when_including(mut self, headers: &[&str]) -> Self {
        self.failing_includes
            .push(headers.iter().map(|h| h.to_string()).collect());
        self
    }

    /// Fail any unit that links all of `labels`.
    pub fn fail_when_linking(mut self, labels: &[&str]) -> Self {
        self.failing_deps
            .push(labels.iter().map(|l| l.to_string()).collect());
        self
    }

    /// Make the header query of `label` exit unsuccessfully.
    pub fn fail_header_query(mut self, label: &str) -> Self {
        self.failing_header_queries.insert(label.to_string());
        self
    }

    /// Never report completion of the named unit.
    pub fn drop_events_for(mut self, unit: &str) -> Self {
        self.dropped_events.insert(unit.to_string());
        self
    }

    /// Append an extra event to every build's stream.
    pub fn extra_event(mut self, unit: &str, success: bool) -> Self {
        self.extra_events.push(CompletionEvent::new(unit, success));
        self
    }

    /// Report every completion twice.
    pub fn repeat_events(mut self) -> Self {
        self.repeat_events = true;
        self
    }

    /// Make every build invocation fail as if Bazel could not run.
    pub fn failing_invocations(mut self) -> Self {
        self.fail_invocations = true;
        self
    }

    /// Units of each `run_build` call, in call order.
    pub fn invocations(&self) -> &[Vec<SyntheticUnit>] {
        &self.invocations
    }

    pub fn queried_modules(&self) -> &[Vec<String>] {
        &self.queried_modules
    }

    fn outcome(&self, unit: &SyntheticUnit) -> bool {
        let included = included_headers(&unit.source);
        let header_conflict = self
            .failing_includes
            .iter()
            .any(|rule| rule.iter().all(|h| included.contains(&h.as_str())));
        let link_conflict = self
            .failing_deps
            .iter()
            .any(|rule| rule.iter().all(|l| unit.deps.iter().any(|d| d.label() == l)));
        !(header_conflict || link_conflict)
    }
}

impl TargetQuery for MockBuild {
    fn library_targets(&mut self, modules: &[String]) -> Result<Vec<LibraryTarget>> {
        self.queried_modules.push(modules.to_vec());
        Ok(self
            .targets
            .iter()
            .filter(|t| t.module().is_some_and(|m| modules.iter().any(|q| q == m)))
            .cloned()
            .collect())
    }

    fn public_headers(&mut self, target: &LibraryTarget) -> Result<HeaderSet> {
        if self.failing_header_queries.contains(target.label()) {
            return Err(ProcessError {
                command: format!("bazel cquery {}", target),
                code: Some(1),
                stderr: "ERROR: Analysis of target failed".to_string(),
            }
            .into());
        }
        match self.headers.get(target.label()) {
            Some(headers) => Ok(headers.clone()),
            None => bail!("unknown target `{}`", target),
        }
    }
}

impl BuildRunner for MockBuild {
    fn run_build(&mut self, units: &[SyntheticUnit]) -> Result<Vec<CompletionEvent>> {
        if self.fail_invocations {
            bail!("failed to spawn `bazel`");
        }

        let mut events: Vec<CompletionEvent> = units
            .iter()
            .filter(|unit| !self.dropped_events.contains(&unit.name))
            .map(|unit| CompletionEvent::new(unit.name.clone(), self.outcome(unit)))
            .collect();

        if self.repeat_events {
            let repeated = events.clone();
            events.extend(repeated);
        }

        // Completion order is not generation order.
        events.reverse();
        events.extend(self.extra_events.iter().cloned());

        self.invocations.push(units.to_vec());
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_included_headers() {
        let source = "// @foo//:lib\n#include \"foo/a.h\"\n#include <stdio.h>\n\nint main() {}\n";
        assert_eq!(included_headers(source), ["foo/a.h"]);
    }

    #[test]
    fn test_mock_filters_targets_by_module() {
        let mut build = MockBuild::new()
            .target("@foo//:lib", &[])
            .target("@@bar~//:lib", &[]);

        let targets = build.library_targets(&["bar".to_string()]).unwrap();
        assert_eq!(targets, vec![LibraryTarget::new("@@bar~//:lib")]);
    }
}
