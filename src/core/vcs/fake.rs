//! In-memory linear history for exercising version and changelog logic

use super::{CommitInfo, GitRepository};
use crate::core::error::{DevError, DevResult, GitError};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

struct FakeCommit {
  info: CommitInfo,
  files: BTreeMap<String, Vec<u8>>,
}

/// Linear history; the last commit is HEAD
pub(crate) struct FakeRepo {
  workdir: PathBuf,
  commits: Vec<FakeCommit>,
  tags: IndexMap<String, String>,
  pub status: Vec<String>,
}

impl FakeRepo {
  pub fn new() -> Self {
    Self {
      workdir: PathBuf::from("/repo"),
      commits: Vec::new(),
      tags: IndexMap::new(),
      status: Vec::new(),
    }
  }

  /// Commit `files` on top of HEAD's snapshot; returns the new sha
  pub fn commit(&mut self, message: &str, files: &[(&str, &str)]) -> String {
    let index = self.commits.len();
    let sha = format!("{:07x}{:033x}", 0xabc0000 + index, index);
    let mut snapshot = self.commits.last().map(|c| c.files.clone()).unwrap_or_default();
    for (path, content) in files {
      snapshot.insert(path.to_string(), content.as_bytes().to_vec());
    }
    let parent_shas = self.commits.last().map(|c| vec![c.info.sha.clone()]).unwrap_or_default();
    self.commits.push(FakeCommit {
      info: CommitInfo {
        short_sha: sha[..7].to_string(),
        sha: sha.clone(),
        message: message.to_string(),
        timestamp: 1_700_000_000 + index as i64 * 60,
        parent_shas,
      },
      files: snapshot,
    });
    sha
  }

  /// Tag HEAD
  pub fn tag(&mut self, name: &str) {
    let head = self.commits.last().map(|c| c.info.sha.clone()).unwrap_or_default();
    self.tags.insert(name.to_string(), head);
  }

  fn index_of(&self, refname: &str) -> DevResult<usize> {
    let sha = self.resolve_ref(refname)?;
    self
      .commits
      .iter()
      .position(|c| c.info.sha == sha)
      .ok_or_else(|| GitError::RefNotFound { refname: sha }.into())
  }

  fn snapshot(&self, refname: &str) -> DevResult<&BTreeMap<String, Vec<u8>>> {
    Ok(&self.commits[self.index_of(refname)?].files)
  }
}

impl GitRepository for FakeRepo {
  fn workdir(&self) -> &Path {
    &self.workdir
  }

  fn resolve_ref(&self, refname: &str) -> DevResult<String> {
    if refname == "HEAD" {
      return self
        .commits
        .last()
        .map(|c| c.info.sha.clone())
        .ok_or_else(|| DevError::from(GitError::RefNotFound { refname: "HEAD".into() }));
    }
    if let Some(sha) = self.tags.get(refname) {
      return Ok(sha.clone());
    }
    self
      .commits
      .iter()
      .find(|c| c.info.sha == refname || c.info.short_sha == refname)
      .map(|c| c.info.sha.clone())
      .ok_or_else(|| {
        GitError::RefNotFound {
          refname: refname.to_string(),
        }
        .into()
      })
  }

  fn list_tags(&self, prefix: &str) -> DevResult<Vec<String>> {
    Ok(self.tags.keys().filter(|t| t.starts_with(prefix)).cloned().collect())
  }

  fn count_commits(&self, since: &str) -> DevResult<u64> {
    let since = self.index_of(since)?;
    Ok((self.commits.len() - 1 - since) as u64)
  }

  fn short_head(&self) -> DevResult<String> {
    let sha = self.resolve_ref("HEAD")?;
    Ok(sha[..7].to_string())
  }

  fn status_porcelain(&self) -> DevResult<Vec<String>> {
    Ok(self.status.clone())
  }

  fn walk(&self, end: &str, hide: Option<&str>) -> DevResult<Vec<CommitInfo>> {
    let end = self.index_of(end)?;
    let start = match hide {
      Some(hide) => self.index_of(hide)? + 1,
      None => 0,
    };
    Ok(
      self.commits[start.min(end + 1)..=end]
        .iter()
        .rev()
        .map(|c| c.info.clone())
        .collect(),
    )
  }

  fn changed_paths(&self, commit: &str, parent: &str) -> DevResult<Vec<String>> {
    let new = self.snapshot(commit)?;
    let old = self.snapshot(parent)?;
    let mut paths: Vec<String> = new
      .iter()
      .filter(|(path, content)| old.get(*path) != Some(*content))
      .map(|(path, _)| path.clone())
      .collect();
    paths.extend(old.keys().filter(|path| !new.contains_key(*path)).cloned());
    Ok(paths)
  }

  fn tree_paths(&self, commit: &str) -> DevResult<Vec<String>> {
    Ok(self.snapshot(commit)?.keys().cloned().collect())
  }

  fn read_file(&self, commit: &str, path: &str) -> DevResult<Option<Vec<u8>>> {
    Ok(self.snapshot(commit)?.get(path).cloned())
  }
}
