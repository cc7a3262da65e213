//! Portability rules for built driver binaries
//!
//! Linux builds must only export the ADBC entry points and must not need a
//! glibc newer than manylinux2014 provides. macOS builds must load on 11.0.

use crate::core::error::ValidationError;
use std::cmp::Ordering;
use std::path::Path;

pub const GLIBC_MAX: &str = "2.17";
pub const GLIBCXX_MAX: &str = "3.4.19";
pub const MACOS_MIN_MAX: &str = "11.0";

/// Compare dotted numeric versions; missing components count as zero
pub fn compare_versions(a: &str, b: &str) -> Option<Ordering> {
  let parse = |v: &str| -> Option<Vec<u64>> { v.trim().split('.').map(|p| p.parse().ok()).collect() };
  let (a, b) = (parse(a)?, parse(b)?);
  let len = a.len().max(b.len());
  let at = |v: &Vec<u64>, i: usize| v.get(i).copied().unwrap_or(0);
  Some(
    (0..len)
      .map(|i| at(&a, i).cmp(&at(&b, i)))
      .find(|o| o.is_ne())
      .unwrap_or(Ordering::Equal),
  )
}

fn violation(binary: &Path, reason: String) -> ValidationError {
  ValidationError::Binary {
    binary: binary.to_path_buf(),
    reason,
  }
}

/// Check `nm --demangle --dynamic` output for a Linux binary
pub fn check_linux_symbols(binary: &Path, nm_output: &str) -> Result<(), ValidationError> {
  let exported: Vec<&str> = nm_output
    .lines()
    .filter_map(|line| line.split_once(" T ").map(|(_, name)| name.trim()))
    .filter(|name| !name.starts_with("Adbc"))
    .collect();
  if !exported.is_empty() {
    let shown: Vec<&str> = exported.iter().take(3).copied().collect();
    return Err(violation(
      binary,
      format!(
        "{}... ({} symbols total) should not be exported",
        shown.join(", "),
        exported.len()
      ),
    ));
  }

  for line in nm_output.lines() {
    let Some((_, version)) = line.split_once('@') else {
      continue;
    };
    let version = version
      .trim_start_matches('@')
      .split_whitespace()
      .next()
      .unwrap_or_default();
    let (label, required, max) = if let Some(v) = version.strip_prefix("GLIBCXX_") {
      ("glibcxx", v, GLIBCXX_MAX)
    } else if let Some(v) = version.strip_prefix("GLIBC_") {
      ("glibc", v, GLIBC_MAX)
    } else {
      continue;
    };
    if compare_versions(required, max) == Some(Ordering::Greater) {
      return Err(violation(
        binary,
        format!("{} requires too new a {} (max {})", line.trim(), label, max),
      ));
    }
  }
  Ok(())
}

/// Check `otool -l` output for a macOS binary
pub fn check_macos_load_commands(binary: &Path, otool_output: &str) -> Result<(), ValidationError> {
  let minos = otool_output
    .lines()
    .map(str::trim)
    .find_map(|line| line.strip_prefix("minos"))
    .map(str::trim)
    .ok_or_else(|| violation(binary, "could not determine minimum macOS version".to_string()))?;

  match compare_versions(minos, MACOS_MIN_MAX) {
    Some(Ordering::Greater) => Err(violation(
      binary,
      format!("requires macOS {} but {} was expected at most", minos, MACOS_MIN_MAX),
    )),
    Some(_) => Ok(()),
    None => Err(violation(binary, format!("unparseable minos `{}`", minos))),
  }
}
