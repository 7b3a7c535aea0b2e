//! Build Event Protocol stream parsing.
//!
//! `bazel build --build_event_json_file=<file>` writes one JSON object per
//! line. Only `targetCompleted` records matter here:
//!
//! ```json
//! {"id":{"targetCompleted":{"label":"//:combo_0","configuration":{"id":"…"}}},"completed":{"success":true}}
//! {"id":{"targetCompleted":{"label":"//:combo_1"}},"completed":{"failureDetail":{"message":"…"}}}
//! {"id":{"targetCompleted":{"label":"//:combo_2"}},"aborted":{"reason":"ANALYSIS_FAILURE"}}
//! ```
//!
//! `success` is omitted when false, and an `aborted` payload means the target
//! never built. Every other record is ignored.

use std::io::BufRead;

use serde::Deserialize;
use thiserror::Error;

use super::CompletionEvent;

/// Errors reading a build event stream.
#[derive(Debug, Error)]
pub enum EventStreamError {
    #[error("malformed build event on line {line}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read build event stream")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Deserialize)]
struct BuildEventRecord {
    #[serde(default)]
    id: Option<BuildEventId>,
    #[serde(default)]
    completed: Option<TargetComplete>,
    #[serde(default)]
    aborted: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuildEventId {
    #[serde(default)]
    target_completed: Option<TargetCompletedId>,
}

#[derive(Debug, Deserialize)]
struct TargetCompletedId {
    label: String,
}

#[derive(Debug, Deserialize)]
struct TargetComplete {
    #[serde(default)]
    success: bool,
}

/// Target name of a label (`//:combo_3` → `combo_3`).
fn target_name(label: &str) -> &str {
    label.rsplit_once(':').map_or(label, |(_, name)| name)
}

/// Parse one stream line.
///
/// Returns `Ok(None)` for records that are not target completions.
pub fn parse_event_line(line: &str) -> Result<Option<CompletionEvent>, serde_json::Error> {
    let record: BuildEventRecord = serde_json::from_str(line)?;

    let Some(label) = record
        .id
        .and_then(|id| id.target_completed)
        .map(|completed| completed.label)
    else {
        return Ok(None);
    };

    let success = match (record.completed, record.aborted) {
        (Some(completed), None) => completed.success,
        _ => false,
    };

    Ok(Some(CompletionEvent::new(target_name(&label), success)))
}

/// Parse a whole stream, skipping blank lines.
pub fn parse_event_stream(reader: impl BufRead) -> Result<Vec<CompletionEvent>, EventStreamError> {
    let mut events = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let parsed = parse_event_line(&line).map_err(|source| EventStreamError::Malformed {
            line: index + 1,
            source,
        })?;

        if let Some(event) = parsed {
            tracing::trace!("{} completed (success: {})", event.unit, event.success);
            events.push(event);
        }
    }

    Ok(events)
}
