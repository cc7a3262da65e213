//! System git backend
//!
//! Every operation is one git subprocess with an isolated environment, so user
//! configuration (pagers, quoting, signing) cannot change the output we parse.

use crate::core::error::{DevError, DevResult, GitError, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Git backend using the system git binary
pub struct SystemGit {
  /// Directory git is run from
  pub(crate) repo_path: PathBuf,

  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open the repository containing `path`
  pub fn open(path: &Path) -> DevResult<Self> {
    let output = base_cmd()
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(DevError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(DevError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = stdout.trim();

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(work_tree),
    })
  }

  /// Get HEAD commit SHA
  pub fn head_commit(&self) -> DevResult<String> {
    let stdout = self.run(&["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&stdout).trim().to_string())
  }

  /// Commit capturing uncommitted tracked changes, `None` on a clean tree
  pub fn stash_create(&self) -> DevResult<Option<String>> {
    let stdout = self.run(&["stash", "create"])?;
    let sha = String::from_utf8_lossy(&stdout).trim().to_string();
    Ok(if sha.is_empty() { None } else { Some(sha) })
  }

  /// Write a gzipped tarball of `commit` to `output`
  pub fn archive(&self, commit: &str, output: &Path) -> DevResult<()> {
    let output = output.to_string_lossy();
    self.run(&["archive", "--format=tgz", "--output", &output, commit])?;
    Ok(())
  }

  /// Run git with `args`, returning stdout on success
  pub(crate) fn run(&self, args: &[&str]) -> DevResult<Vec<u8>> {
    debug!(repo = %self.repo_path.display(), "git {}", args.join(" "));
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.join(" ")))?;

    if !output.status.success() {
      return Err(DevError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }
    Ok(output.stdout)
  }

  /// Create a safe git command with isolated environment, run from the repo path
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = base_cmd();
    cmd.arg("-C").arg(&self.repo_path);
    cmd
  }
}

/// git with a cleared environment (PATH and HOME kept) and safe config overrides
fn base_cmd() -> Command {
  let mut cmd = Command::new("git");

  cmd.env_clear();
  if let Ok(path) = std::env::var("PATH") {
    cmd.env("PATH", path);
  }
  if let Ok(home) = std::env::var("HOME") {
    cmd.env("HOME", home);
  }

  cmd.arg("-c").arg("protocol.version=2");
  cmd.arg("-c").arg("advice.detachedHead=false");
  cmd.arg("-c").arg("core.quotePath=false");

  cmd
}

/// `(sha, tag)` pairs for every tag of a remote repository
pub fn ls_remote_tags(url: &str) -> DevResult<Vec<(String, String)>> {
  debug!("git ls-remote --refs --tags {}", url);
  let output = base_cmd()
    .args(["ls-remote", "--refs", "--tags", "--quiet", url])
    .output()
    .with_context(|| format!("Failed to execute git ls-remote for {}", url))?;

  if !output.status.success() {
    return Err(DevError::Git(GitError::CommandFailed {
      command: format!("git ls-remote --refs --tags {}", url),
      stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }));
  }

  Ok(parse_ls_remote(&String::from_utf8_lossy(&output.stdout)))
}

fn parse_ls_remote(stdout: &str) -> Vec<(String, String)> {
  stdout
    .lines()
    .filter_map(|line| {
      let (sha, refname) = line.split_once(char::is_whitespace)?;
      let tag = refname.trim().strip_prefix("refs/tags/")?;
      Some((sha.to_string(), tag.to_string()))
    })
    .collect()
}
