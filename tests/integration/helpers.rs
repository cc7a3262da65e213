//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A driver repository with git history
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
  /// Seconds added to the base commit date, so history order is deterministic
  clock: Cell<u32>,
}

impl TestWorkspace {
  /// Create a repository with a single README commit
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    // Initialize git repo with main as default branch
    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;

    let ws = Self {
      _root: root,
      path,
      clock: Cell::new(0),
    };
    ws.write("README.md", "# Test drivers\n")?;
    ws.commit("chore: initial commit")?;
    Ok(ws)
  }

  /// Write a file, creating parent directories
  pub fn write(&self, path: &str, content: &str) -> Result<PathBuf> {
    let file = self.path.join(path);
    if let Some(parent) = file.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&file, content)?;
    Ok(file)
  }

  /// Commit all changes, returning the new HEAD
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;

    let tick = self.clock.get() + 1;
    self.clock.set(tick);
    let date = format!("2025-01-01T00:{:02}:{:02}Z", tick / 60, tick % 60);
    let output = Command::new("git")
      .current_dir(&self.path)
      .env("GIT_AUTHOR_DATE", &date)
      .env("GIT_COMMITTER_DATE", &date)
      .args(["commit", "-m", message])
      .output()
      .context("Failed to run git commit")?;
    if !output.status.success() {
      anyhow::bail!("git commit failed: {}", String::from_utf8_lossy(&output.stderr));
    }

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Create a lightweight tag at HEAD
  pub fn tag(&self, name: &str) -> Result<()> {
    git(&self.path, &["tag", name])?;
    Ok(())
  }

  /// Check if a file exists
  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  /// Read a file
  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the CLI without checking its exit status
pub fn run_cli_unchecked(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_adbc-drivers-dev");
  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("RUST_LOG")
    .env_remove("VERBOSE")
    .env_remove("CI")
    .output()
    .context("Failed to run adbc-drivers-dev")
}

/// Run the CLI, failing on a nonzero exit
pub fn run_cli(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_cli_unchecked(cwd, args)?;
  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "adbc-drivers-dev {} failed\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }
  Ok(output)
}

/// Stdout as a string
pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

/// Stderr as a string
pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}
