//! Mapping declared header files to include paths.
//!
//! The header cquery (see [`super::HEADERS_QUERY_FILE`]) prints, per target,
//! a JSON object with the execroot-relative paths of the direct public
//! headers and the include directories of the compilation context:
//!
//! ```json
//! {"headers": ["external/foo~/include/foo/foo.h"],
//!  "includes": ["external/foo~/include"]}
//! ```
//!
//! A header's include path is its path relative to the longest include
//! directory containing it, or else relative to its external repository root.

use std::cmp::Reverse;

use serde::Deserialize;

use crate::core::HeaderSet;

/// Raw output of the header cquery for one target.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CqueryHeaders {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub includes: Vec<String>,
}

/// Path below `external/<repo>/`, if the header lives in an external repo.
fn repo_relative(path: &str) -> Option<&str> {
    let start = if path.starts_with("external/") {
        0
    } else {
        path.find("/external/")? + 1
    };
    let rest = &path[start + "external/".len()..];
    rest.split_once('/').map(|(_, relative)| relative)
}

/// Convert cquery output into the include paths a consumer would write.
pub fn include_paths(raw: &CqueryHeaders) -> HeaderSet {
    let mut dirs: Vec<&str> = raw
        .includes
        .iter()
        .map(|dir| dir.trim_end_matches('/'))
        .filter(|dir| !dir.is_empty() && *dir != ".")
        .collect();
    dirs.sort_by_key(|dir| Reverse(dir.len()));

    HeaderSet::new(raw.headers.iter().map(|header| {
        dirs.iter()
            .find_map(|dir| {
                header
                    .strip_prefix(dir)
                    .and_then(|rest| rest.strip_prefix('/'))
            })
            .or_else(|| repo_relative(header))
            .unwrap_or(header)
            .to_string()
    }))
}
