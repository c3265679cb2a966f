//! Common test utilities shared across integration tests.
//!
//! Note: Clippy cannot track usage across integration test files,
//! hence the `allow(dead_code)` annotation. This is a standard pattern
//! for Rust integration test fixtures.
#![cfg(test)]
#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use std::process::Command as StdCommand;
use tempfile::TempDir;

pub struct TestFixture {
    _temp_dir: TempDir,
    repo_root: PathBuf,
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let repo_root = temp_dir.path().to_path_buf();
        init_repo(&repo_root);

        std::fs::write(repo_root.join("README.md"), "hello\n").expect("failed to write seed file");
        git(&repo_root, &["add", "."]);
        git(&repo_root, &["commit", "-q", "-m", "init"]);

        Self { _temp_dir: temp_dir, repo_root }
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("ghost").expect("ghost binary not found");
        cmd.current_dir(&self.repo_root);
        cmd.env("GHOST_HOOK_SETTINGS", self.repo_root.join("claude-settings.json"));
        cmd
    }

    pub fn enable(&self) {
        self.command().arg("enable").arg("--force").assert().success();
    }
}

fn init_repo(dir: &Path) {
    StdCommand::new("git").args(["init", "-q"]).current_dir(dir).status().expect("git init failed");
    StdCommand::new("git")
        .args(["config", "user.email", "t@example.com"])
        .current_dir(dir)
        .status()
        .expect("git config failed");
    StdCommand::new("git")
        .args(["config", "user.name", "Test"])
        .current_dir(dir)
        .status()
        .expect("git config failed");
}

fn git(dir: &Path, args: &[&str]) {
    let status = StdCommand::new("git").args(args).current_dir(dir).status().expect("git command failed");
    assert!(status.success(), "git {args:?} failed");
}
