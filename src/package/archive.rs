//! Reproducible gzip-compressed tarballs
//!
//! Entries carry fixed metadata (mtime 0, mode 0644, uid/gid 0) and the gzip
//! header has no timestamp, so identical inputs give identical bytes.

use super::Package;
use crate::core::error::{DevResult, ResultExt};
use flate2::{Compression, GzBuilder};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tar::{Builder, EntryType, Header};

/// Write `entries` as a `.tar.gz` stream
pub fn write_tar_gz<W: Write>(sink: W, entries: &[(&str, &[u8])]) -> DevResult<W> {
  let encoder = GzBuilder::new().mtime(0).write(sink, Compression::default());
  let mut tar = Builder::new(encoder);
  for (name, data) in entries {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Regular);
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    tar
      .append_data(&mut header, name, *data)
      .with_context(|| format!("Failed to add {} to archive", name))?;
  }
  let encoder = tar.into_inner().context("Failed to finish tar stream")?;
  Ok(encoder.finish().context("Failed to finish gzip stream")?)
}

/// Write `package` under `output_dir`, returning the archive path
pub fn write_package(output_dir: &Path, package: &Package) -> DevResult<PathBuf> {
  let path = output_dir.join(package.relative_path());
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
  }
  let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;

  let entries: Vec<(&str, &[u8])> = package
    .files
    .iter()
    .map(|(name, data)| (name.as_str(), data.as_slice()))
    .collect();
  let mut writer = write_tar_gz(BufWriter::new(file), &entries)?;
  writer.flush().with_context(|| format!("Failed to write {}", path.display()))?;
  Ok(path)
}
