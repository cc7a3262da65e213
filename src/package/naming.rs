//! Naming conventions for driver binaries and CI artifact directories
//!
//! Binaries are `[lib]adbc_driver_<name>.<ext>`; CI uploads them in
//! directories named `drivers-<platform>-<architecture>`.

use super::{Architecture, Platform};
use crate::core::error::{DevResult, NamingError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Shared library extensions searched for, in discovery order
pub const LIBRARY_EXTENSIONS: [&str; 3] = ["dll", "dylib", "so"];

/// A built driver found in an input directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDriver {
  pub platform: Platform,
  pub architecture: Architecture,
  pub path: PathBuf,
}

/// Convert `libadbc_driver_redshift.so` to `redshift`
pub fn normalize_driver_name(filename: &str) -> Result<String, NamingError> {
  let stem = filename.split_once('.').map_or(filename, |(stem, _)| stem);
  let stem = stem.strip_prefix("lib").unwrap_or(stem);
  let invalid = || NamingError::DriverFile { name: stem.to_string() };

  let parts: Vec<&str> = stem.split('_').collect();
  match parts.as_slice() {
    ["adbc", "driver", name] => Ok(name.to_string()),
    _ => Err(invalid()),
  }
}

/// Split `drivers-<platform>-<architecture>` into its parts
pub fn parse_input_dir(name: &str) -> Result<(Platform, Architecture), NamingError> {
  let parts: Vec<&str> = name.split('-').collect();
  match parts.as_slice() {
    ["drivers", platform, architecture] => Ok((Platform::parse(platform)?, Architecture::parse(architecture)?)),
    _ => Err(NamingError::InputDirectory { name: name.to_string() }),
  }
}

/// Collect binaries for `driver_name` from every input directory
///
/// Files whose name does not follow the convention, or names another driver,
/// are skipped.
pub fn find_drivers(driver_name: &str, input_dirs: &[PathBuf]) -> DevResult<Vec<DiscoveredDriver>> {
  let mut drivers = Vec::new();
  for input_dir in input_dirs {
    let dir_name = input_dir
      .file_name()
      .map(|n| n.to_string_lossy().to_string())
      .unwrap_or_default();
    let (platform, architecture) = parse_input_dir(&dir_name)?;

    for path in libraries_under(input_dir)? {
      let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
      match normalize_driver_name(&filename) {
        Ok(name) if name == driver_name => {
          println!("Found {}_{} driver: {}", platform, architecture, path.display());
          drivers.push(DiscoveredDriver {
            platform,
            architecture,
            path,
          });
        }
        Ok(other) => debug!("Skipping {} (driver {})", path.display(), other),
        Err(e) => debug!("Skipping {}: {}", path.display(), e),
      }
    }
  }
  Ok(drivers)
}

fn libraries_under(dir: &Path) -> DevResult<Vec<PathBuf>> {
  let root = glob::Pattern::escape(&dir.to_string_lossy());
  let mut found = Vec::new();
  for ext in LIBRARY_EXTENSIONS {
    let pattern = format!("{}/**/*.{}", root, ext);
    for entry in glob::glob(&pattern)? {
      match entry {
        Ok(path) if path.is_file() => found.push(path),
        Ok(_) => {}
        Err(e) => debug!("Unreadable path while searching {}: {}", dir.display(), e),
      }
    }
  }
  Ok(found)
}
