//! Scratch Bazel workspace.
//!
//! The workspace is a throwaway directory holding:
//!
//! ```text
//! cc-conflicts-XXXX/
//! ├── MODULE.bazel          # bazel_dep() per scanned module
//! ├── .bazelrc              # --registry pointing at the scanned registry
//! ├── cc_headers.cquery     # starlark formatter for header introspection
//! ├── BUILD.bazel           # synthetic cc_binary units of the current build
//! └── combo_0.cc ...        # one translation unit per synthetic unit
//! ```
//!
//! It is removed by [`ScratchWorkspace::cleanup`] after a completed scan and
//! left behind otherwise.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::build::{SyntheticUnit, HEADERS_QUERY_FILE};
use crate::registry::ModuleVersion;
use crate::util::fs::{remove_dir_all_if_exists, write_string};

/// Name of the root module declared in the scratch workspace.
const ROOT_MODULE_NAME: &str = "cc_conflicts_scan";

/// Starlark formatter printing a target's public headers and include dirs.
///
/// The `CcInfo` provider key differs between Bazel versions (`CcInfo` for the
/// native rules, `…%CcInfo` once the rules are Starlark), so it is matched by
/// suffix.
const HEADERS_QUERY: &str = r#"def format(target):
    p = providers(target)
    cc = None
    for key in p:
        if key == "CcInfo" or key.endswith("%CcInfo"):
            cc = p[key]
    if cc == None:
        return json.encode({"headers": [], "includes": []})
    ctx = cc.compilation_context
    return json.encode({
        "headers": [h.path for h in ctx.direct_public_headers],
        "includes": ctx.includes.to_list() + ctx.quote_includes.to_list() + ctx.system_includes.to_list(),
    })
"#;

/// A module dependency declared in `MODULE.bazel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDep {
    pub name: String,
    pub version: ModuleVersion,
}

impl ModuleDep {
    pub fn new(name: impl Into<String>, version: impl Into<ModuleVersion>) -> Self {
        ModuleDep {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// A throwaway Bazel workspace for one scan.
#[derive(Debug)]
pub struct ScratchWorkspace {
    root: PathBuf,
}

impl ScratchWorkspace {
    /// Create a fresh workspace under the system temp directory.
    pub fn create() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("cc-conflicts-")
            .tempdir()
            .context("failed to create scratch workspace")?;

        // Removal is explicit via `cleanup`.
        let root = dir.keep();
        tracing::debug!("Created scratch workspace {}", root.display());
        Ok(ScratchWorkspace { root })
    }

    /// Use an existing directory as the workspace.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        ScratchWorkspace { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write every file needed before the first Bazel invocation.
    pub fn initialize(&self, deps: &[ModuleDep], registry: Option<&Path>) -> Result<()> {
        self.write_module_file(deps)?;
        self.write_bazelrc(registry)?;
        write_string(&self.root.join(HEADERS_QUERY_FILE), HEADERS_QUERY)?;
        write_string(&self.root.join("BUILD.bazel"), "")?;
        Ok(())
    }

    /// (Re)write `MODULE.bazel` with one `bazel_dep` per module.
    pub fn write_module_file(&self, deps: &[ModuleDep]) -> Result<()> {
        let mut contents = format!("module(name = \"{}\")\n\n", ROOT_MODULE_NAME);
        for dep in deps {
            contents.push_str(&format!(
                "bazel_dep(name = \"{}\", version = \"{}\")\n",
                dep.name, dep.version
            ));
        }
        write_string(&self.root.join("MODULE.bazel"), &contents)
    }

    fn write_bazelrc(&self, registry: Option<&Path>) -> Result<()> {
        let mut contents = String::from("common --enable_bzlmod\n");
        if let Some(registry) = registry {
            contents.push_str(&format!("common --registry=file://{}\n", registry.display()));
        }
        write_string(&self.root.join(".bazelrc"), &contents)
    }

    /// Replace `BUILD.bazel` with the given units and write their sources.
    pub fn write_units(&self, units: &[SyntheticUnit]) -> Result<()> {
        let mut build = String::new();

        for unit in units {
            write_string(&self.root.join(unit.source_file()), &unit.source)?;

            build.push_str(&format!("# {}\n", unit.description));
            build.push_str("cc_binary(\n");
            build.push_str(&format!("    name = \"{}\",\n", unit.name));
            build.push_str(&format!("    srcs = [\"{}\"],\n", unit.source_file()));
            build.push_str("    deps = [\n");
            for dep in &unit.deps {
                build.push_str(&format!("        \"{}\",\n", dep));
            }
            build.push_str("    ],\n)\n\n");
        }

        write_string(&self.root.join("BUILD.bazel"), &build)
    }

    /// Delete the workspace.
    pub fn cleanup(self) -> Result<()> {
        tracing::debug!("Removing scratch workspace {}", self.root.display());
        remove_dir_all_if_exists(&self.root)
    }
}
