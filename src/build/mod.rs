//! Build-system boundary.
//!
//! The conflict engine talks to the build system through two narrow traits:
//! [`TargetQuery`] for discovery and introspection, and [`BuildRunner`] for
//! compiling synthetic units. [`Bazel`] implements both by shelling out;
//! tests use a scripted implementation.

mod bazel;
mod events;
mod headers;

use anyhow::Result;

use crate::core::{HeaderSet, LibraryTarget};

pub use bazel::{Bazel, HEADERS_QUERY_FILE};
pub use events::{parse_event_line, parse_event_stream, EventStreamError};
pub use headers::{include_paths, CqueryHeaders};

/// A generated, throwaway `cc_binary` used to probe for conflicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntheticUnit {
    /// Target name, unique within the scratch workspace
    pub name: String,
    /// Comment written above the target declaration
    pub description: String,
    /// Libraries the unit links against
    pub deps: Vec<LibraryTarget>,
    /// Contents of the unit's single source file
    pub source: String,
}

impl SyntheticUnit {
    /// Source file name of the unit.
    pub fn source_file(&self) -> String {
        format!("{}.cc", self.name)
    }
}

/// Completion of one synthetic unit, as reported by the build system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEvent {
    /// Target name of the completed unit
    pub unit: String,
    pub success: bool,
}

impl CompletionEvent {
    pub fn new(unit: impl Into<String>, success: bool) -> Self {
        CompletionEvent {
            unit: unit.into(),
            success,
        }
    }
}

/// Discovery queries against the scratch workspace.
pub trait TargetQuery {
    /// Public `cc_library` targets of the given modules, in query order.
    fn library_targets(&mut self, modules: &[String]) -> Result<Vec<LibraryTarget>>;

    /// Declared public headers of a target, as include paths.
    ///
    /// A [`ProcessError`](crate::util::process::ProcessError) or malformed
    /// query output concerns this target only; the caller may carry on.
    fn public_headers(&mut self, target: &LibraryTarget) -> Result<HeaderSet>;
}

/// Compiles and links synthetic units.
pub trait BuildRunner {
    /// Build all units and return one event per completed unit.
    ///
    /// Events may arrive in any order. A unit that fails to build is not an
    /// error; only failing to run the build system or to read its event
    /// stream is.
    fn run_build(&mut self, units: &[SyntheticUnit]) -> Result<Vec<CompletionEvent>>;
}

/// A build system that can both be queried and build units.
pub trait BuildSystem: TargetQuery + BuildRunner {}

impl<T: TargetQuery + BuildRunner + ?Sized> BuildSystem for T {}

/// Render a translation unit including the given headers of each member.
///
/// Each member contributes a `// <label>` marker followed by its quoted
/// includes; an empty header set contributes only the marker. The unit ends
/// with an empty `main` so it links as a binary.
pub fn translation_unit<'a, I>(members: I) -> String
where
    I: IntoIterator<Item = (&'a LibraryTarget, &'a HeaderSet)>,
{
    let mut source = String::new();

    for (target, headers) in members {
        source.push_str(&format!("// {}\n", target));
        for header in headers.iter() {
            source.push_str(&format!("#include \"{}\"\n", header));
        }
    }

    source.push_str("\nint main() {}\n");
    source
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_unit_layout() {
        let foo = LibraryTarget::new("@foo//:lib");
        let bar = LibraryTarget::new("@bar//:lib");
        let foo_headers = HeaderSet::new(["foo/a.h", "foo/b.h"]);
        let bar_headers = HeaderSet::default();

        let source = translation_unit([(&foo, &foo_headers), (&bar, &bar_headers)]);
        assert_eq!(
            source,
            "// @foo//:lib\n#include \"foo/a.h\"\n#include \"foo/b.h\"\n// @bar//:lib\n\nint main() {}\n"
        );
    }
}
