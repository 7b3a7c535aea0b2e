//! Library targets and their public header sets.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// `@foo//…`, `@@foo~//…`, `@@foo+//…`, `@@foo~1.2.3//…`
static REPO_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@@?([A-Za-z0-9_.\-]+?)(?:[~+][^/]*)?//").expect("valid regex"));

/// A publicly visible `cc_library` of a registry module.
///
/// Identified by its fully-qualified Bazel label as reported by `bazel query`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LibraryTarget {
    label: String,
}

impl LibraryTarget {
    pub fn new(label: impl Into<String>) -> Self {
        LibraryTarget {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Name of the module owning this target.
    ///
    /// Canonical repository suffixes (`~`, `+`, version) and the `@@` form are
    /// stripped. Returns `None` for main-repository labels.
    pub fn module(&self) -> Option<&str> {
        REPO_PREFIX
            .captures(&self.label)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Whether the target belongs to the named module.
    pub fn belongs_to(&self, module: &str) -> bool {
        self.module() == Some(module)
    }
}

impl fmt::Display for LibraryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Ordered header include-paths of a library's public interface.
///
/// Used both for the declared set and for the reduced set that survives
/// probing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HeaderSet {
    headers: Vec<String>,
}

impl HeaderSet {
    /// Create a header set, dropping repeated entries but keeping order.
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for header in headers {
            let header = header.into();
            if !unique.contains(&header) {
                unique.push(header);
            }
        }
        HeaderSet { headers: unique }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// The headers at the given positions, in position order.
    ///
    /// Out-of-range positions are ignored.
    pub fn select(&self, positions: &[usize]) -> HeaderSet {
        HeaderSet {
            headers: positions
                .iter()
                .filter_map(|&i| self.headers.get(i).cloned())
                .collect(),
        }
    }

    /// Headers of `self` that are not in `kept`.
    pub fn dropped_from<'a>(&'a self, kept: &HeaderSet) -> Vec<&'a str> {
        self.iter()
            .filter(|header| !kept.headers.iter().any(|k| k == header))
            .collect()
    }
}
