//! Path lists kept at the repository root (`.rat-excludes`, `.rat-apache`)

use crate::core::error::{DevResult, ResultExt};
use glob::Pattern;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const EXCLUDES_FILE: &str = ".rat-excludes";
pub const APACHE_FILE: &str = ".rat-apache";

/// Non-empty, non-comment lines of `path`; a missing file is an empty list
pub fn read_list(path: &Path) -> DevResult<Vec<String>> {
  if !path.is_file() {
    return Ok(Vec::new());
  }
  let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  Ok(
    content
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty() && !line.starts_with('#'))
      .map(str::to_string)
      .collect(),
  )
}

/// Shell-style patterns; `*` also matches `/`
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
  patterns: Vec<Pattern>,
}

impl Exclusions {
  pub fn new(lines: &[String]) -> Self {
    let patterns = lines
      .iter()
      .map(|line| {
        Pattern::new(line).unwrap_or_else(|e| {
          debug!("Treating `{}` as a literal path: {}", line, e);
          Pattern::new(&Pattern::escape(line)).unwrap_or_default()
        })
      })
      .collect();
    Self { patterns }
  }

  /// Load `<root>/.rat-excludes`
  pub fn load(root: &Path) -> DevResult<Self> {
    Ok(Self::new(&read_list(&root.join(EXCLUDES_FILE))?))
  }

  pub fn is_excluded(&self, name: &str) -> bool {
    self.patterns.iter().any(|p| p.matches(name))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_read_list_skips_comments() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join(EXCLUDES_FILE);
    fs::write(&path, "# generated\n\ngo/go.sum\n  *.png  \n").unwrap();
    assert_eq!(read_list(&path).unwrap(), ["go/go.sum", "*.png"]);
    assert!(read_list(&tmp.path().join("missing")).unwrap().is_empty());
  }

  #[test]
  fn test_patterns_match_like_fnmatch() {
    let exclusions = Exclusions::new(&["*.png".to_string(), "go/testdata/*".to_string(), "[bad".to_string()]);
    assert!(exclusions.is_excluded("docs/img/logo.png"));
    assert!(exclusions.is_excluded("go/testdata/a/b.json"));
    assert!(exclusions.is_excluded("[bad"));
    assert!(!exclusions.is_excluded("go/driver.go"));
  }
}
