//! Shared helpers for CLI specs.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub use serde_json::{json, Value};

/// A throwaway state directory plus content directory for one spec.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("state/jobs")).unwrap();
        std::fs::create_dir_all(dir.path().join("content")).unwrap();
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_dir(&self) -> PathBuf {
        self.path().join("state")
    }

    pub fn content_dir(&self) -> PathBuf {
        self.path().join("content")
    }

    pub fn record_path(&self, id: &str) -> PathBuf {
        self.state_dir().join("jobs").join(format!("{id}.json"))
    }

    /// Write a job record as if an earlier process had saved it.
    pub fn record(&self, id: &str, mut record: Value) {
        record["id"] = json!(id);
        std::fs::write(self.record_path(id), serde_json::to_vec_pretty(&record).unwrap()).unwrap();
    }

    pub fn read_record(&self, id: &str) -> Value {
        serde_json::from_slice(&std::fs::read(self.record_path(id)).unwrap()).unwrap()
    }

    /// Install an executable `bun` stub in `<project>/bin` that runs `script`
    /// with `/bin/sh`.
    pub fn fake_bun(&self, script: &str) {
        use std::os::unix::fs::PermissionsExt;

        let bin = self.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let path = bin.join("bun");
        std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    pub fn cli(&self) -> CliBuilder {
        let path = format!("{}:/usr/bin:/bin", self.path().join("bin").display());
        cli()
            .env("DOCSYNC_STATE_DIR", self.state_dir())
            .env("DOCSYNC_CONTENT_DIR", self.content_dir())
            .env("PATH", path)
    }
}

/// `docsync-jobs` with a clean environment apart from `HOME`.
pub fn cli() -> CliBuilder {
    let mut cmd = assert_cmd::Command::cargo_bin("docsync-jobs").unwrap();
    cmd.env_clear().env("NO_COLOR", "1").env("RUST_LOG", "warn");
    if let Some(home) = std::env::var_os("HOME") {
        cmd.env("HOME", home);
    }
    CliBuilder { cmd }
}

pub struct CliBuilder {
    cmd: assert_cmd::Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    fn run(mut self) -> RunOutput {
        let output = self.cmd.output().unwrap();
        RunOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    pub fn passes(self) -> RunOutput {
        self.exits(0)
    }

    pub fn exits(self, code: i32) -> RunOutput {
        let out = self.run();
        assert_eq!(out.code, Some(code), "unexpected exit code\n{out}");
        out
    }
}

pub struct RunOutput {
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl std::fmt::Display for RunOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "exit: {:?}\nstdout:\n{}\nstderr:\n{}", self.code, self.stdout, self.stderr)
    }
}

impl RunOutput {
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.stdout).unwrap_or_else(|e| panic!("invalid JSON ({e})\n{self}"))
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        assert!(self.stdout.contains(needle), "stdout missing {needle:?}\n{self}");
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        assert!(!self.stdout.contains(needle), "stdout unexpectedly has {needle:?}\n{self}");
        self
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        assert_eq!(self.stdout, expected, "\n{self}");
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        assert!(self.stderr.contains(needle), "stderr missing {needle:?}\n{self}");
        self
    }
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap().as_millis() as u64
}

pub const HOUR_MS: u64 = 60 * 60 * 1000;
