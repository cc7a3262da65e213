//! Utility functions for cross-platform path handling and flag parsing

use std::path::Path;

/// Convert a path to Git format (always forward slashes)
///
/// Git expects paths with forward slashes, even on Windows.
pub fn path_to_git_format(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}

/// True when `path` is `prefix` itself or lies beneath it
///
/// Matching is per path component: `go` covers `go/x.go` but not `golang/x.go`.
/// An empty prefix or `.` covers everything.
pub fn path_has_prefix(path: &str, prefix: &str) -> bool {
  let prefix = prefix.trim_end_matches('/');
  if prefix.is_empty() || prefix == "." {
    return true;
  }
  match path.strip_prefix(prefix) {
    Some(rest) => rest.is_empty() || rest.starts_with('/'),
    None => false,
  }
}

/// Parse a boolean flag value (`1/true/yes`, `0/false/no`, case-insensitive)
pub fn parse_bool(value: &str) -> Result<bool, String> {
  match value.trim().to_ascii_lowercase().as_str() {
    "1" | "true" | "yes" => Ok(true),
    "0" | "false" | "no" => Ok(false),
    other => Err(format!("Invalid boolean value: {}", other)),
  }
}

/// Split a comma-separated list, dropping empty items
pub fn split_list(value: &str) -> Vec<String> {
  value
    .split(',')
    .map(str::trim)
    .filter(|item| !item.is_empty())
    .map(str::to_string)
    .collect()
}
