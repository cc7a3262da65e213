//! Repository hygiene checks run in CI
//!
//! Both checks look at what git would ship rather than the working tree:
//! a `git archive` of HEAD (or of a stash commit when there are local
//! changes), so ignored files never produce findings.
//!
//! - **copyright**: current-year copyright headers
//! - **rat**: Apache RAT license audit plus ADBC header rules
//! - **exclusions**: `.rat-excludes` / `.rat-apache` lists

pub mod copyright;
pub mod exclusions;
pub mod rat;

use crate::core::error::{DevError, DevResult, ResultExt, ValidationError};
use crate::core::vcs::SystemGit;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// A regular file from the snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
  pub name: String,
  pub data: Vec<u8>,
}

impl ArchiveEntry {
  /// The first `count` lines, or `None` when they are not UTF-8
  pub fn head_lines(&self, count: usize) -> Option<Vec<&str>> {
    let mut lines = Vec::with_capacity(count);
    for line in self.data.split_inclusive(|b| *b == b'\n').take(count) {
      lines.push(std::str::from_utf8(line).ok()?);
    }
    Some(lines)
  }
}

/// A `git archive` of the repository's current content
pub struct Snapshot {
  // keeps the archive on disk for tools that read it directly
  _scratch: TempDir,
  archive: PathBuf,
  pub commit: String,
}

impl Snapshot {
  pub fn capture(root: &Path) -> DevResult<Self> {
    let git = SystemGit::open(root)?;
    let commit = match git.stash_create()? {
      Some(stash) => stash,
      None => git.head_commit()?,
    };
    debug!("Snapshotting {} at {}", root.display(), commit);

    let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
    let archive = scratch.path().join("snapshot.tar.gz");
    git.archive(&commit, &archive)?;
    Ok(Self {
      _scratch: scratch,
      archive,
      commit,
    })
  }

  pub fn archive_path(&self) -> &Path {
    &self.archive
  }

  /// Regular files in archive order
  pub fn entries(&self) -> DevResult<Vec<ArchiveEntry>> {
    let file = File::open(&self.archive).with_context(|| format!("Failed to open {}", self.archive.display()))?;
    read_entries(GzDecoder::new(file))
  }
}

/// Regular files from a tar stream
pub fn read_entries<R: Read>(reader: R) -> DevResult<Vec<ArchiveEntry>> {
  let mut archive = tar::Archive::new(reader);
  let mut entries = Vec::new();
  for entry in archive.entries().context("Failed to read archive")? {
    let mut entry = entry.context("Failed to read archive entry")?;
    if !entry.header().entry_type().is_file() {
      continue;
    }
    let name = entry.path().context("Invalid path in archive")?.to_string_lossy().to_string();
    let mut data = Vec::new();
    entry
      .read_to_end(&mut data)
      .with_context(|| format!("Failed to read {} from archive", name))?;
    entries.push(ArchiveEntry { name, data });
  }
  Ok(entries)
}

/// Turn a findings count into the command result
pub fn findings_result(check: &str, count: usize) -> DevResult<()> {
  if count == 0 {
    return Ok(());
  }
  Err(DevError::Validation(ValidationError::Findings {
    check: check.to_string(),
    count: u32::try_from(count).unwrap_or(u32::MAX),
  }))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_read_entries_skips_directories() {
    let mut builder = tar::Builder::new(Vec::new());
    let mut dir = tar::Header::new_gnu();
    dir.set_entry_type(tar::EntryType::Directory);
    dir.set_size(0);
    dir.set_mode(0o755);
    builder.append_data(&mut dir, "go/", std::io::empty()).unwrap();
    let mut file = tar::Header::new_gnu();
    file.set_size(2);
    file.set_mode(0o644);
    file.set_entry_type(tar::EntryType::Regular);
    builder.append_data(&mut file, "go/a.go", &b"hi"[..]).unwrap();
    let bytes = builder.into_inner().unwrap();

    let entries = read_entries(bytes.as_slice()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "go/a.go");
    assert_eq!(entries[0].data, b"hi");
  }

  #[test]
  fn test_head_lines() {
    let entry = ArchiveEntry {
      name: "a".into(),
      data: b"one\ntwo\nthree\n".to_vec(),
    };
    assert_eq!(entry.head_lines(2).unwrap(), ["one\n", "two\n"]);
    let binary = ArchiveEntry {
      name: "b".into(),
      data: vec![0xff, 0xfe, b'\n'],
    };
    assert!(binary.head_lines(2).is_none());
  }

  #[test]
  fn test_findings_result() {
    assert!(findings_result("copyright", 0).is_ok());
    let err = findings_result("copyright", 3).unwrap_err();
    assert_eq!(err.exit_code().as_i32(), 3);
  }
}
