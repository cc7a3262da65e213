//! Git access behind a narrow interface
//!
//! Version and changelog derivation only need a handful of read operations.
//! They are expressed as [`GitRepository`] so that the derivation logic can run
//! against [`SystemGit`] in production and an in-memory fake in tests.

#[cfg(test)]
pub(crate) mod fake;
pub mod system_git;
mod system_git_ops;

pub use system_git::{SystemGit, ls_remote_tags};

use crate::core::error::DevResult;
use std::path::Path;

/// Information about a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
  pub sha: String,
  pub short_sha: String,
  /// Full message, trimmed
  pub message: String,
  /// Committer time, seconds since the epoch
  pub timestamp: i64,
  pub parent_shas: Vec<String>,
}

impl CommitInfo {
  /// First line of the message
  pub fn summary(&self) -> &str {
    self.message.lines().next().unwrap_or_default()
  }
}

/// Read-only git operations used by version and changelog derivation
pub trait GitRepository {
  /// Working tree root
  fn workdir(&self) -> &Path;

  /// Resolve a ref (tag, branch, sha) to a full commit sha
  fn resolve_ref(&self, refname: &str) -> DevResult<String>;

  /// Tags starting with `prefix`, in no particular order
  fn list_tags(&self, prefix: &str) -> DevResult<Vec<String>>;

  /// Number of commits in `since..HEAD`
  fn count_commits(&self, since: &str) -> DevResult<u64>;

  /// Abbreviated HEAD sha
  fn short_head(&self) -> DevResult<String>;

  /// `git status --porcelain` lines, untracked entries included
  fn status_porcelain(&self) -> DevResult<Vec<String>>;

  /// Commits reachable from `end` but not from `hide`, newest first by commit time
  fn walk(&self, end: &str, hide: Option<&str>) -> DevResult<Vec<CommitInfo>>;

  /// Paths that differ between `parent` and `commit`; renames yield both paths
  fn changed_paths(&self, commit: &str, parent: &str) -> DevResult<Vec<String>>;

  /// Every file path in the commit's tree
  fn tree_paths(&self, commit: &str) -> DevResult<Vec<String>>;

  /// Contents of `path` at `commit`, `None` if it does not exist there
  fn read_file(&self, commit: &str, path: &str) -> DevResult<Option<Vec<u8>>>;
}
