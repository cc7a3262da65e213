//! GitRepository implementation for SystemGit (tags, walking, diffs)

use super::system_git::SystemGit;
use super::{CommitInfo, GitRepository};
use crate::core::error::{DevError, DevResult, GitError, ResultExt};
use std::path::Path;

/// Field and record separators for `git log` output
const FIELD_SEP: char = '\x1f';
const RECORD_SEP: char = '\x1e';

impl GitRepository for SystemGit {
  fn workdir(&self) -> &Path {
    &self.work_tree
  }

  fn resolve_ref(&self, refname: &str) -> DevResult<String> {
    let spec = format!("{}^{{commit}}", refname);
    let output = self
      .git_cmd()
      .args(["rev-parse", "--verify", "--quiet", &spec])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      return Err(DevError::Git(GitError::RefNotFound {
        refname: refname.to_string(),
      }));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  fn list_tags(&self, prefix: &str) -> DevResult<Vec<String>> {
    let pattern = format!("{}*", prefix);
    let stdout = self.run(&["tag", "-l", "--no-column", "--no-color", &pattern])?;
    Ok(
      String::from_utf8_lossy(&stdout)
        .lines()
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect(),
    )
  }

  fn count_commits(&self, since: &str) -> DevResult<u64> {
    let range = format!("{}..HEAD", since);
    let stdout = self.run(&["rev-list", "--count", &range])?;
    Ok(String::from_utf8_lossy(&stdout).trim().parse::<u64>()?)
  }

  fn short_head(&self) -> DevResult<String> {
    let stdout = self.run(&["rev-parse", "--short", "HEAD"])?;
    Ok(String::from_utf8_lossy(&stdout).trim().to_string())
  }

  fn status_porcelain(&self) -> DevResult<Vec<String>> {
    let stdout = self.run(&["status", "--porcelain"])?;
    Ok(
      String::from_utf8_lossy(&stdout)
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect(),
    )
  }

  fn walk(&self, end: &str, hide: Option<&str>) -> DevResult<Vec<CommitInfo>> {
    let format = format!("--format=%H{f}%h{f}%ct{f}%P{f}%B{r}", f = "%x1f", r = "%x1e");
    let hidden = hide.map(|hide| format!("^{}", hide));
    let mut args = vec!["log", "--date-order", format.as_str(), end];
    if let Some(hidden) = &hidden {
      args.push(hidden);
    }
    args.push("--");
    let stdout = self.run(&args)?;
    parse_log_output(&String::from_utf8_lossy(&stdout))
  }

  fn changed_paths(&self, commit: &str, parent: &str) -> DevResult<Vec<String>> {
    let stdout = self.run(&["diff", "--name-only", "--no-renames", parent, commit, "--"])?;
    Ok(lines(&stdout))
  }

  fn tree_paths(&self, commit: &str) -> DevResult<Vec<String>> {
    let stdout = self.run(&["ls-tree", "-r", "--name-only", commit])?;
    Ok(lines(&stdout))
  }

  fn read_file(&self, commit: &str, path: &str) -> DevResult<Option<Vec<u8>>> {
    let spec = format!("{}:{}", commit, path);
    let output = self
      .git_cmd()
      .args(["show", &spec])
      .output()
      .context("Failed to read file from commit")?;

    if !output.status.success() {
      // file doesn't exist at this commit
      return Ok(None);
    }
    Ok(Some(output.stdout))
  }
}

fn lines(stdout: &[u8]) -> Vec<String> {
  String::from_utf8_lossy(stdout)
    .lines()
    .filter(|line| !line.is_empty())
    .map(str::to_string)
    .collect()
}

/// Parse `git log` records of `%H %h %ct %P %B`, separated by 0x1f / 0x1e
fn parse_log_output(output: &str) -> DevResult<Vec<CommitInfo>> {
  let mut commits = Vec::new();
  for record in output.split(RECORD_SEP) {
    let record = record.trim_start_matches('\n');
    if record.trim().is_empty() {
      continue;
    }
    let fields: Vec<&str> = record.splitn(5, FIELD_SEP).collect();
    if fields.len() != 5 {
      return Err(DevError::message(format!("Malformed git log record: {:?}", record)));
    }
    commits.push(CommitInfo {
      sha: fields[0].to_string(),
      short_sha: fields[1].to_string(),
      timestamp: fields[2]
        .parse::<i64>()
        .map_err(|_| DevError::message(format!("Invalid commit timestamp: {}", fields[2])))?,
      parent_shas: fields[3].split_whitespace().map(str::to_string).collect(),
      message: fields[4].trim().to_string(),
    });
  }
  Ok(commits)
}
