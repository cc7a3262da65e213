//! `update-actions`: pin every `uses: owner/repo@ref` to the newest tag's commit

use crate::core::error::{DevResult, ResultExt};
use crate::core::vcs::ls_remote_tags;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const ACTION_PATTERN: &str = r"uses: ([\w\-/]+)@([\w\-.]+)(\W*#.*)?";

/// Tags a remote action repository offers
pub trait TagSource {
  /// `(sha, tag)` pairs for `action` (`owner/repo`)
  fn tags(&self, action: &str) -> DevResult<Vec<(String, String)>>;
}

/// Queries github.com with `git ls-remote`
pub struct GitHubTags;

impl TagSource for GitHubTags {
  fn tags(&self, action: &str) -> DevResult<Vec<(String, String)>> {
    ls_remote_tags(&format!("https://github.com/{}", action))
  }
}

/// The tag an action should be pinned to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestAction {
  pub tag: String,
  pub sha: String,
}

/// Tags that never denote a release
fn is_ignored_tag(tag: &str) -> bool {
  tag == "master" || tag.contains("-node") || tag == "testEnableForGHES"
}

/// Numeric components of `v1.2.3`-style tags; `None` for anything else
fn version_key(tag: &str) -> Option<Vec<u64>> {
  let mut parts: Vec<u64> = tag
    .trim_start_matches('v')
    .split('.')
    .map(|p| p.parse().ok())
    .collect::<Option<_>>()?;
  while parts.len() > 1 && parts.last() == Some(&0) {
    parts.pop();
  }
  Some(parts)
}

/// Newest release among `tags`; on equal versions the more specific tag wins
pub fn latest_tag(tags: &[(String, String)]) -> Option<LatestAction> {
  tags
    .iter()
    .filter(|(_, tag)| !is_ignored_tag(tag))
    .filter_map(|(sha, tag)| match version_key(tag) {
      Some(key) => Some((key, sha, tag)),
      None => {
        debug!("Ignoring unversioned tag {}", tag);
        None
      }
    })
    .max_by(|a, b| a.0.cmp(&b.0).then_with(|| a.2.len().cmp(&b.2.len())))
    .map(|(_, sha, tag)| LatestAction {
      tag: tag.clone(),
      sha: sha.clone(),
    })
}

/// Rewrites action pins, caching one remote lookup per action
pub struct ActionUpdater<S: TagSource> {
  source: S,
  pattern: Regex,
  cache: HashMap<String, Option<LatestAction>>,
}

impl<S: TagSource> ActionUpdater<S> {
  pub fn new(source: S) -> DevResult<Self> {
    Ok(Self {
      source,
      pattern: Regex::new(ACTION_PATTERN)?,
      cache: HashMap::new(),
    })
  }

  fn latest(&mut self, action: &str) -> DevResult<Option<LatestAction>> {
    if let Some(found) = self.cache.get(action) {
      return Ok(found.clone());
    }
    let latest = latest_tag(&self.source.tags(action)?);
    self.cache.insert(action.to_string(), latest.clone());
    Ok(latest)
  }

  /// Rewrite every pin in `content`, printing what changed
  pub fn update_content(&mut self, content: &str) -> DevResult<String> {
    let mut result = String::with_capacity(content.len());
    let mut last = 0;
    let matches: Vec<(usize, usize, String, String)> = self
      .pattern
      .captures_iter(content)
      .filter_map(|caps| {
        let whole = caps.get(0)?;
        Some((whole.start(), whole.end(), caps[1].to_string(), caps[2].to_string()))
      })
      .collect();

    for (start, end, action, current) in matches {
      result.push_str(&content[last..start]);
      match self.latest(&action)? {
        Some(latest) => {
          if current == latest.sha {
            println!("  {} already at {} ({})", action, latest.sha, latest.tag);
          } else {
            println!("  {} updated from {} to {} ({})", action, current, latest.sha, latest.tag);
          }
          result.push_str(&format!("uses: {}@{}  # {}", action, latest.sha, latest.tag));
        }
        None => {
          println!("  {} has no release tags, leaving {}", action, current);
          result.push_str(&content[start..end]);
        }
      }
      last = end;
    }
    result.push_str(&content[last..]);
    Ok(result)
  }

  /// Update every `*.yaml` under `dir`, returning the files visited
  pub fn update_dir(&mut self, dir: &Path) -> DevResult<Vec<PathBuf>> {
    let pattern = format!("{}/**/*.yaml", glob::Pattern::escape(&dir.to_string_lossy()));
    let mut visited = Vec::new();
    for entry in glob::glob(&pattern)? {
      let path = match entry {
        Ok(path) => path,
        Err(e) => {
          debug!("Skipping unreadable path: {}", e);
          continue;
        }
      };
      println!("Updating {}", path.display());
      let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
      let updated = self.update_content(&content)?;
      if updated != content {
        fs::write(&path, updated).with_context(|| format!("Failed to write {}", path.display()))?;
      }
      visited.push(path);
    }
    Ok(visited)
  }
}
