//! Bazel-backed implementation of the build-system traits.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use super::events::parse_event_stream;
use super::headers::{include_paths, CqueryHeaders};
use super::{BuildRunner, CompletionEvent, SyntheticUnit, TargetQuery};
use crate::core::{HeaderSet, LibraryTarget};
use crate::util::fs::remove_file_if_exists;
use crate::util::process::ProcessBuilder;
use crate::workspace::ScratchWorkspace;

/// Starlark formatter file used by the header cquery.
pub const HEADERS_QUERY_FILE: &str = "cc_headers.cquery";

/// Build event stream written by each `bazel build`.
const EVENTS_FILE: &str = "build_events.json";

/// `query --keep_going`: 0 = complete, 3 = partial results.
const QUERY_EXIT_CODES: &[i32] = &[0, 3];

/// `build --keep_going`: 0 = all built, 1 = some targets failed.
const BUILD_EXIT_CODES: &[i32] = &[0, 1];

/// Runs Bazel inside a scratch workspace.
#[derive(Debug, Clone)]
pub struct Bazel {
    program: PathBuf,
    root: PathBuf,
    startup_args: Vec<String>,
    build_args: Vec<String>,
}

impl Bazel {
    pub fn new(program: impl Into<PathBuf>, workspace: &ScratchWorkspace) -> Self {
        Bazel {
            program: program.into(),
            root: workspace.root().to_path_buf(),
            startup_args: Vec::new(),
            build_args: Vec::new(),
        }
    }

    /// Arguments placed before the Bazel command.
    pub fn startup_args(mut self, args: Vec<String>) -> Self {
        self.startup_args = args;
        self
    }

    /// Extra arguments for every `bazel build`.
    pub fn build_args(mut self, args: Vec<String>) -> Self {
        self.build_args = args;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn command(&self, command: &str) -> ProcessBuilder {
        ProcessBuilder::new(&self.program)
            .args(&self.startup_args)
            .arg(command)
            .cwd(&self.root)
    }

    fn workspace(&self) -> ScratchWorkspace {
        ScratchWorkspace::at(&self.root)
    }
}

/// Query expression selecting public `cc_library` targets of the modules.
pub(crate) fn library_query(modules: &[String]) -> String {
    modules
        .iter()
        .map(|module| {
            format!(
                "kind(cc_library, attr(visibility, \"//visibility:public\", @{}//...))",
                module
            )
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

impl TargetQuery for Bazel {
    fn library_targets(&mut self, modules: &[String]) -> Result<Vec<LibraryTarget>> {
        if modules.is_empty() {
            return Ok(Vec::new());
        }

        let output = self
            .command("query")
            .arg(library_query(modules))
            .arg("--keep_going")
            .exec_accepting(QUERY_EXIT_CODES)
            .context("failed to query library targets")?;

        if output.status.code() == Some(3) {
            tracing::warn!("`bazel query` returned partial results; some packages failed to load");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut targets: Vec<LibraryTarget> = Vec::new();
        for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let target = LibraryTarget::new(line);
            if !targets.contains(&target) {
                targets.push(target);
            }
        }

        tracing::debug!("Found {} library targets", targets.len());
        Ok(targets)
    }

    fn public_headers(&mut self, target: &LibraryTarget) -> Result<HeaderSet> {
        let output = self
            .command("cquery")
            .arg(target.label())
            .arg("--output=starlark")
            .arg(format!("--starlark:file={}", HEADERS_QUERY_FILE))
            .exec_and_check()
            .with_context(|| format!("failed to query headers of `{}`", target))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let Some(line) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) else {
            return Ok(HeaderSet::default());
        };

        let raw: CqueryHeaders = serde_json::from_str(line)
            .with_context(|| format!("unexpected header query output for `{}`: {}", target, line))?;
        Ok(include_paths(&raw))
    }
}

impl BuildRunner for Bazel {
    fn run_build(&mut self, units: &[SyntheticUnit]) -> Result<Vec<CompletionEvent>> {
        if units.is_empty() {
            return Ok(Vec::new());
        }

        self.workspace().write_units(units)?;

        let events_path = self.root.join(EVENTS_FILE);
        remove_file_if_exists(&events_path)?;

        let output = self
            .command("build")
            .arg("--keep_going")
            .arg(format!("--build_event_json_file={}", events_path.display()))
            .args(&self.build_args)
            .args(units.iter().map(|unit| format!("//:{}", unit.name)))
            .exec_accepting(BUILD_EXIT_CODES)
            .context("failed to build synthetic units")?;

        tracing::debug!(
            "`bazel build` of {} units exited with {:?}",
            units.len(),
            output.status.code()
        );

        if !events_path.exists() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "`bazel build` wrote no build event stream to {}\n{}",
                events_path.display(),
                stderr.trim_end()
            );
        }

        let file = File::open(&events_path)
            .with_context(|| format!("failed to open {}", events_path.display()))?;
        let events = parse_event_stream(BufReader::new(file))
            .with_context(|| format!("failed to read {}", events_path.display()))?;
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_query_expression() {
        let query = library_query(&["foo".to_string(), "bar".to_string()]);
        assert_eq!(
            query,
            "kind(cc_library, attr(visibility, \"//visibility:public\", @foo//...)) + \
             kind(cc_library, attr(visibility, \"//visibility:public\", @bar//...))"
        );
    }

    #[test]
    fn test_missing_program_fails_to_spawn() {
        let tmp = tempfile::tempdir().unwrap();
        let ws = ScratchWorkspace::at(tmp.path());
        let mut bazel = Bazel::new("/nonexistent/bazel", &ws);

        let err = bazel.library_targets(&["foo".to_string()]).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to spawn"));
    }
}
