//! A throwaway workspace with a scripted stand-in for `bazel`.
//!
//! The script logs `<cwd>|<argv>` per call, answers `query` from a targets
//! file, and makes `run` append one ledger row using the forwarded arguments.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const HEADER: &str =
    "datetime,bench_set,function_name,test_name,mean,variance,stdev,coef_of_variance\n";

const FAKE_BAZEL: &str = r#"#!/bin/sh
echo "$(pwd -P)|$*" >> "$FAKE_BAZEL_LOG"
case "$1" in
  query)
    if [ -n "$FAKE_QUERY_FAIL" ]; then
      echo "ERROR: no such package 'broken'" >&2
      exit 7
    fi
    cat "$FAKE_TARGETS"
    ;;
  run)
    if [ "$2" = "$FAKE_FAILING_TARGET" ]; then
      exit 3
    fi
    echo "$4,$2,fn,case,1,0,0,0" >> "$5"
    ;;
  *)
    exit 2
    ;;
esac
"#;

pub struct FakeWorkspace {
    pub dir: TempDir,
}

impl FakeWorkspace {
    pub fn new(targets: &str) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        fs::create_dir(dir.path().join("bench")).expect("failed to create bench dir");
        fs::write(dir.path().join("targets.txt"), targets).expect("failed to write targets");

        let script = dir.path().join("fake-bazel");
        fs::write(&script, FAKE_BAZEL).expect("failed to write fake bazel");
        make_executable(&script);

        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn bench_dir(&self) -> PathBuf {
        self.root().join("bench")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.bench_dir().join("bench_results.csv")
    }

    pub fn ledger(&self) -> String {
        fs::read_to_string(self.ledger_path()).expect("ledger should exist")
    }

    pub fn log_path(&self) -> PathBuf {
        self.root().join("bazel.log")
    }

    /// Logged calls, one `<cwd>|<argv>` string each.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.log_path())
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn run_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.contains("|run "))
            .collect()
    }

    /// `benchsweep` wired to this workspace through the environment.
    #[allow(deprecated)]
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd =
            assert_cmd::Command::cargo_bin("benchsweep").expect("failed to find benchsweep binary");
        cmd.env("BUILD_WORKSPACE_DIRECTORY", self.root())
            .env("FAKE_BAZEL_LOG", self.log_path())
            .env("FAKE_TARGETS", self.root().join("targets.txt"))
            .env_remove("FAKE_QUERY_FAIL")
            .env_remove("FAKE_FAILING_TARGET")
            .env_remove("RUST_LOG")
            .arg("--build-tool")
            .arg(self.root().join("fake-bazel"));
        cmd
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path).expect("stat script").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod script");
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}
