//! Result aggregation.
//!
//! [`ResultAggregator`] starts with one pending [`TargetBuildResult`] per
//! planned combination and settles each from the build's completion events.
//! Events that do not fit (unknown unit, second event for a unit) and
//! results that never settle are kept as [`ConsistencyFault`]s instead of
//! being guessed at.

mod format;

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::build::CompletionEvent;
use crate::core::{BuildStatus, Combination, TargetBuildResult};
use crate::util::diagnostic::Diagnostics;

pub use format::{format_report, format_report_json, status_tag, OutputFormat, OutputFormatParseError};

/// A mismatch between the planned combinations and the event stream.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConsistencyFault {
    #[error("completion event for unknown unit `{unit}`")]
    UnknownUnit { unit: String, success: bool },

    #[error("duplicate completion event for `{unit}` (already recorded as {recorded})")]
    DuplicateEvent { unit: String, recorded: BuildStatus },

    #[error("no completion event for `{unit}` ({description})")]
    StillPending { unit: String, description: String },
}

/// Counts over all combinations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub combinations: usize,
    pub ok: usize,
    pub failed: usize,
    pub pending: usize,
}

impl std::fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} combinations: {} ok, {} failed, {} pending",
            self.combinations, self.ok, self.failed, self.pending
        )
    }
}

/// Final outcome of a scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// One result per combination, in planning order
    pub combinations: Vec<TargetBuildResult>,
    pub faults: Vec<ConsistencyFault>,
    pub warnings: Diagnostics,
    pub summary: ScanSummary,
}

impl ScanReport {
    /// A report without combinations, carrying only diagnostics.
    pub fn empty(warnings: Diagnostics) -> Self {
        ScanReport {
            warnings,
            ..ScanReport::default()
        }
    }

    fn count(&self, status: BuildStatus) -> usize {
        self.combinations
            .iter()
            .filter(|r| r.status() == status)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.count(BuildStatus::Failure)
    }

    pub fn pending_count(&self) -> usize {
        self.count(BuildStatus::Pending)
    }

    /// No combination failed and the event stream was consistent.
    pub fn passed(&self) -> bool {
        self.failed_count() == 0 && self.faults.is_empty()
    }
}

/// Correlates completion events with planned combinations.
#[derive(Debug)]
pub struct ResultAggregator {
    results: Vec<TargetBuildResult>,
    by_unit: HashMap<String, usize>,
    faults: Vec<ConsistencyFault>,
}

impl ResultAggregator {
    pub fn new(combinations: &[Combination]) -> Self {
        let results: Vec<TargetBuildResult> =
            combinations.iter().map(TargetBuildResult::pending).collect();
        let by_unit = results
            .iter()
            .enumerate()
            .map(|(index, result)| (result.id().target_name(), index))
            .collect();

        ResultAggregator {
            results,
            by_unit,
            faults: Vec::new(),
        }
    }

    /// Settle the combination the event belongs to.
    pub fn record(&mut self, event: &CompletionEvent) {
        let Some(&index) = self.by_unit.get(&event.unit) else {
            tracing::warn!("completion event for unknown unit {}", event.unit);
            self.faults.push(ConsistencyFault::UnknownUnit {
                unit: event.unit.clone(),
                success: event.success,
            });
            return;
        };

        if let Err(recorded) = self.results[index].settle(event.success) {
            tracing::warn!("duplicate completion event for {}", event.unit);
            self.faults.push(ConsistencyFault::DuplicateEvent {
                unit: event.unit.clone(),
                recorded,
            });
        }
    }

    pub fn record_all<'a>(&mut self, events: impl IntoIterator<Item = &'a CompletionEvent>) {
        for event in events {
            self.record(event);
        }
    }

    /// Close the aggregation. Unsettled results become faults.
    pub fn finish(self, warnings: Diagnostics) -> ScanReport {
        let mut faults = self.faults;
        faults.extend(
            self.results
                .iter()
                .filter(|r| r.status() == BuildStatus::Pending)
                .map(|r| ConsistencyFault::StillPending {
                    unit: r.id().target_name(),
                    description: r.description().to_string(),
                }),
        );

        let mut report = ScanReport {
            combinations: self.results,
            faults,
            warnings,
            summary: ScanSummary::default(),
        };
        report.summary = ScanSummary {
            combinations: report.combinations.len(),
            ok: report.count(BuildStatus::Success),
            failed: report.failed_count(),
            pending: report.pending_count(),
        };
        report
    }
}
