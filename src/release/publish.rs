//! Draft GitHub releases for driver tags

use crate::core::error::{DevError, DevResult, ResultExt};
use crate::core::process::ToolCommand;
use crate::core::vcs::GitRepository;
use crate::release::changelog::{Changelog, ChangelogBuilder};
use std::io::Write;
use std::path::Path;

/// A release tag split into driver subdirectory and version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseTag {
  pub tag: String,
  /// `.` for a driver at the repository root
  pub subdir: String,
  /// Tag prefix shared by this driver's releases
  pub prefix: String,
  pub version: semver::Version,
}

impl ReleaseTag {
  /// Parse `vX.Y.Z` or `<subdir>/vX.Y.Z`
  pub fn parse(tag: &str) -> DevResult<Self> {
    let (subdir, version_part) = match tag.rsplit_once('/') {
      Some((subdir, version)) => (subdir.to_string(), version),
      None => (".".to_string(), tag),
    };
    let bare = version_part.strip_prefix('v').ok_or_else(|| {
      DevError::with_help(
        format!("Release tag {} does not end in v<version>", tag),
        "Tags look like v1.2.3 or <driver>/v1.2.3.",
      )
    })?;
    let version = semver::Version::parse(bare)
      .map_err(|e| DevError::message(format!("Invalid version in tag {}: {}", tag, e)))?;
    let prefix = if subdir == "." {
      "v".to_string()
    } else {
      format!("{}/v", subdir)
    };
    Ok(Self {
      tag: tag.to_string(),
      subdir,
      prefix,
      version,
    })
  }

  /// Newest tag of the same driver with a strictly lower version
  pub fn previous(&self, repo: &dyn GitRepository) -> DevResult<Option<String>> {
    let previous = repo
      .list_tags(&self.prefix)?
      .into_iter()
      .filter_map(|tag| {
        let version = semver::Version::parse(tag.strip_prefix(&self.prefix)?).ok()?;
        (version < self.version).then_some((version, tag))
      })
      .max_by(|a, b| a.0.cmp(&b.0));
    Ok(previous.map(|(_, tag)| tag))
  }
}

/// Changelog for `tag`, starting after the previous release of the same driver
pub fn release_changelog(repo: &dyn GitRepository, release: &ReleaseTag) -> DevResult<Changelog> {
  let previous = release.previous(repo)?;
  ChangelogBuilder::new(repo).build(
    &release.subdir,
    &release.version.to_string(),
    previous.as_deref(),
    &release.tag,
  )
}

/// `gh release create` for a draft with the given notes file
pub fn gh_release_command(root: &Path, tag: &str, title: &str, notes_file: &Path) -> ToolCommand {
  ToolCommand::new("gh")
    .args(["release", "create", tag, "--draft", "--title", title, "--verify-tag", "--notes-file"])
    .arg(notes_file.to_string_lossy())
    .current_dir(root)
}

/// Write the notes to a temporary Markdown file and create the draft release
pub fn publish(root: &Path, changelog: &Changelog, tag: &str, dry_run: bool) -> DevResult<()> {
  let mut notes = tempfile::Builder::new()
    .suffix(".md")
    .tempfile()
    .context("Failed to create release notes file")?;
  notes
    .write_all(changelog.body().as_bytes())
    .context("Failed to write release notes")?;
  notes.flush()?;

  let command = gh_release_command(root, tag, &changelog.title(), notes.path());
  println!("* {}", command.display());
  if dry_run {
    println!("Dry run, not actually releasing");
    return Ok(());
  }
  command.run()
}
