//! Registry module versions.
//!
//! Registry versions are not strictly semver (`1.2.3.bcr.1`, `20240116.2`,
//! `3.0.0-rc1`). They are ordered the way Bazel orders module versions:
//! release segments first (numeric segments numerically, textual segments
//! lexically, numbers before text), then a release sorts after any
//! prerelease of the same core. Build metadata after `+` is ignored.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Segment {
    Number(u64),
    Text(String),
}

fn segments(part: &str) -> Vec<Segment> {
    part.split('.')
        .map(|s| match s.parse::<u64>() {
            Ok(n) => Segment::Number(n),
            Err(_) => Segment::Text(s.to_string()),
        })
        .collect()
}

/// A version string as listed in a module's `metadata.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleVersion(String);

impl ModuleVersion {
    pub fn new(version: impl Into<String>) -> Self {
        ModuleVersion(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// (release, is_release, prerelease)
    fn sort_key(&self) -> (Vec<Segment>, bool, Vec<Segment>) {
        let without_build = self.0.split('+').next().unwrap_or_default();
        match without_build.split_once('-') {
            Some((release, pre)) => (segments(release), false, segments(pre)),
            None => (segments(without_build), true, Vec::new()),
        }
    }
}

impl PartialEq for ModuleVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ModuleVersion {}

impl PartialOrd for ModuleVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModuleVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleVersion {
    fn from(s: &str) -> Self {
        ModuleVersion::new(s)
    }
}
