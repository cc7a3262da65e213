//! Driver versions derived from git tags
//!
//! A driver living at `<repo>/<sub>` is released with tags `<sub>/vX.Y.Z`; a
//! driver at the repository root uses plain `vX.Y.Z`. The version is the newest
//! matching tag, with `-dev.<count>.<sha>` when HEAD is past it and `-dirty`
//! when tracked files are modified. Strict mode refuses both.

use crate::core::error::{DevResult, ResultExt, VersionError};
use crate::core::vcs::{GitRepository, SystemGit};
use crate::utils::path_to_git_format;
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Files that mark a directory as a driver root
pub const MANIFEST_MARKERS: [&str; 2] = ["Cargo.toml", "go.mod"];

/// Version reported when no release tag exists yet
pub const UNKNOWN_VERSION: &str = "unknown";

/// Where a driver sits inside its repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverLocation {
  pub driver_root: PathBuf,
  pub repo_root: PathBuf,
  /// Tag prefix, ending in `v`
  pub prefix: String,
}

impl DriverLocation {
  /// Find the repository above `driver_root` and derive the tag prefix
  pub fn locate(driver_root: &Path) -> DevResult<Self> {
    if !MANIFEST_MARKERS.iter().any(|name| driver_root.join(name).is_file()) {
      return Err(
        VersionError::NoManifest {
          driver_root: driver_root.to_path_buf(),
        }
        .into(),
      );
    }

    let driver_root =
      fs::canonicalize(driver_root).with_context(|| format!("Failed to resolve {}", driver_root.display()))?;
    let repo_root = driver_root
      .ancestors()
      .find(|dir| dir.join(".git").exists())
      .ok_or_else(|| VersionError::NotInRepository {
        driver_root: driver_root.clone(),
      })?
      .to_path_buf();

    let relative = driver_root.strip_prefix(&repo_root)?;
    Ok(Self {
      prefix: tag_prefix(relative),
      driver_root,
      repo_root,
    })
  }
}

/// `v` at the repository root, `<relative>/v` below it
pub fn tag_prefix(relative: &Path) -> String {
  let relative = path_to_git_format(relative);
  if relative.is_empty() || relative == "." {
    "v".to_string()
  } else {
    format!("{}/v", relative.trim_end_matches('/'))
  }
}

/// Sort tags newest first by the semantic version after `prefix`
///
/// Tags whose suffix is not a valid version sort after every valid one.
pub fn sort_tags_descending(tags: &mut [String], prefix: &str) {
  let parse = |tag: &str| tag.strip_prefix(prefix).and_then(|v| semver::Version::parse(v).ok());
  tags.sort_by(|a, b| match (parse(a), parse(b)) {
    (Some(va), Some(vb)) => vb.cmp(&va).then_with(|| b.cmp(a)),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => b.cmp(a),
  });
}

/// Resolve the version of the driver at `driver_root`
pub fn resolve(driver_root: &Path, strict: bool) -> DevResult<String> {
  let location = DriverLocation::locate(driver_root)?;
  let git = SystemGit::open(&location.repo_root)?;
  resolve_with(&git, &location, strict)
}

/// Resolve against any repository backend
pub fn resolve_with(repo: &dyn GitRepository, location: &DriverLocation, strict: bool) -> DevResult<String> {
  let prefix = &location.prefix;
  let mut tags = repo.list_tags(prefix)?;
  sort_tags_descending(&mut tags, prefix);
  debug!(prefix = %prefix, candidates = tags.len(), "Resolving driver version");

  let mut version = match tags.first() {
    None => {
      if strict {
        return Err(
          VersionError::NoTagsFound {
            driver_root: location.driver_root.clone(),
            prefix: prefix.clone(),
          }
          .into(),
        );
      }
      UNKNOWN_VERSION.to_string()
    }
    Some(tag) => {
      // keep the trailing `v` of the prefix
      let mut version = tag[prefix.len() - 1..].to_string();
      let count = repo.count_commits(tag)?;
      if count > 0 {
        if strict {
          return Err(
            VersionError::NotOnTag {
              driver_root: location.driver_root.clone(),
              tag: tag.clone(),
              count,
            }
            .into(),
          );
        }
        version = format!("{}-dev.{}.{}", version, count, repo.short_head()?);
      }
      version
    }
  };

  let status = repo.status_porcelain()?;
  if status.iter().any(|line| !line.starts_with("?? ")) {
    if strict {
      warn!("{} has uncommitted changes. `git status --porcelain`:", location.repo_root.display());
      for line in &status {
        warn!("> {}", line);
      }
      return Err(
        VersionError::DirtyTree {
          repo: location.repo_root.clone(),
          entries: status,
        }
        .into(),
      );
    }
    version.push_str("-dirty");
  }

  Ok(version)
}
