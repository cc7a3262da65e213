//! Driver package manifests (`manifest.toml` / `MANIFEST`)

use crate::core::error::{DevResult, ManifestError, ResultExt};
use std::fs;
use std::path::Path;
use toml_edit::{DocumentMut, Item, Table};

/// Top-level string fields every manifest needs, in the order they are checked
pub const REQUIRED_FIELDS: [&str; 5] = ["name", "description", "publisher", "license", "version"];

/// Load a manifest template, keeping its formatting
pub fn load(path: &Path) -> DevResult<DocumentMut> {
  let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  content
    .parse::<DocumentMut>()
    .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Check the required fields, reporting the first problem found
pub fn validate_manifest(manifest: &DocumentMut) -> Result<(), ManifestError> {
  for field in REQUIRED_FIELDS {
    check_string(manifest.get(field), field)?;
  }

  let files = manifest
    .get("Files")
    .and_then(Item::as_table_like)
    .ok_or(ManifestError::MissingFilesTable)?;
  check_string(files.get("driver"), "Files.driver")
}

fn check_string(item: Option<&Item>, field: &str) -> Result<(), ManifestError> {
  let item = item.ok_or_else(|| ManifestError::MissingField { field: field.to_string() })?;
  let value = item.as_str().ok_or_else(|| ManifestError::NotAString { field: field.to_string() })?;
  if value.is_empty() {
    return Err(ManifestError::Empty { field: field.to_string() });
  }
  Ok(())
}

/// Copy of `template` stamped with a version and the binary it ships
pub fn stamp(template: &DocumentMut, version: &str, driver_file: &str) -> DocumentMut {
  let mut manifest = template.clone();
  manifest["version"] = toml_edit::value(version);
  let mut files = Table::new();
  files.insert("driver", toml_edit::value(driver_file));
  manifest["Files"] = Item::Table(files);
  manifest
}

/// A top-level string field, if present
pub fn string_field<'a>(manifest: &'a DocumentMut, field: &str) -> Option<&'a str> {
  manifest.get(field).and_then(Item::as_str)
}
