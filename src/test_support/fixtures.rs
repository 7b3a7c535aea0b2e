//! Test fixtures: on-disk registries and a scripted `bazel` executable.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::registry::LocalRegistry;

/// A registry checkout in a temporary directory.
pub struct RegistryFixture {
    dir: TempDir,
}

impl RegistryFixture {
    /// Create an empty registry (`modules/` only).
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("modules")).unwrap();
        std::fs::write(dir.path().join("bazel_registry.json"), "{}\n").unwrap();
        RegistryFixture { dir }
    }

    /// Add a module with the given versions, some of them yanked.
    pub fn module(self, name: &str, versions: &[&str], yanked: &[&str]) -> Self {
        let yanked: serde_json::Map<String, serde_json::Value> = yanked
            .iter()
            .map(|v| (v.to_string(), serde_json::Value::from("yanked for testing")))
            .collect();
        let metadata = serde_json::json!({
            "homepage": format!("https://example.com/{}", name),
            "versions": versions,
            "yanked_versions": yanked,
        });
        self.raw_metadata(name, &metadata.to_string())
    }

    /// Add a module with verbatim `metadata.json` contents.
    pub fn raw_metadata(self, name: &str, contents: &str) -> Self {
        let module_dir = self.dir.path().join("modules").join(name);
        std::fs::create_dir_all(&module_dir).unwrap();
        std::fs::write(module_dir.join("metadata.json"), contents).unwrap();
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn open(&self) -> LocalRegistry {
        LocalRegistry::open(self.dir.path()).unwrap()
    }
}

impl Default for RegistryFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Shell script mimicking the Bazel commands the scanner runs.
///
/// - `query` prints `@<module>//:lib` for each of `foo`, `bar` and `baz`
///   named in the query expression
/// - `cquery` prints `foo.h` for foo and `bar.h` + `broken.h` for bar; it
///   fails the analysis of baz
/// - `build` writes a build event stream; a unit fails when its source
///   includes `broken.h`
#[cfg(unix)]
pub const FAKE_BAZEL: &str = r#"#!/bin/sh
cmd="$1"
shift
case "$cmd" in
  query)
    for module in foo bar baz; do
      case "$1" in
        *"@$module//"*) echo "@$module//:lib" ;;
      esac
    done
    ;;
  cquery)
    case "$1" in
      @foo*) echo '{"headers":["external/foo~/include/foo.h"],"includes":["external/foo~/include"]}' ;;
      @baz*)
        echo "ERROR: Analysis of target '$1' failed; build aborted" >&2
        exit 1
        ;;
      *) echo '{"headers":["external/bar~/bar.h","external/bar~/broken.h"],"includes":[]}' ;;
    esac
    ;;
  build)
    out=""
    for arg in "$@"; do
      case "$arg" in
        --build_event_json_file=*) out="${arg#--build_event_json_file=}" ;;
      esac
    done
    echo '{"id":{"started":{}},"started":{"command":"build"}}' > "$out"
    status=0
    for arg in "$@"; do
      case "$arg" in
        //:*)
          name="${arg#//:}"
          if grep -q 'broken.h' "$name.cc"; then
            echo "{\"id\":{\"targetCompleted\":{\"label\":\"$arg\"}},\"completed\":{}}" >> "$out"
            status=1
          else
            echo "{\"id\":{\"targetCompleted\":{\"label\":\"$arg\"}},\"completed\":{\"success\":true}}" >> "$out"
          fi
          ;;
      esac
    done
    exit $status
    ;;
esac
"#;

/// Write [`FAKE_BAZEL`] into `dir` and make it executable.
#[cfg(unix)]
pub fn install_fake_bazel(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("bazel");
    std::fs::write(&path, FAKE_BAZEL).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}
