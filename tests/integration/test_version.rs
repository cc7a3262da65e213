//! Integration tests for `version`

use crate::helpers::{TestWorkspace, run_cli, run_cli_unchecked, stderr, stdout};
use anyhow::Result;

fn go_driver() -> Result<TestWorkspace> {
  let ws = TestWorkspace::new()?;
  ws.write("go/go.mod", "module github.com/adbc-drivers/example/go\n")?;
  ws.commit("feat(go): add driver")?;
  Ok(ws)
}

#[test]
fn test_version_on_tag() -> Result<()> {
  let ws = go_driver()?;
  ws.tag("go/v1.2.0")?;
  ws.tag("go/v1.10.0")?;

  let output = run_cli(&ws.path, &["version", "go"])?;
  assert_eq!(stdout(&output).trim(), "v1.10.0");

  let output = run_cli(&ws.path, &["version", "go", "--strict"])?;
  assert_eq!(stdout(&output).trim(), "v1.10.0");

  Ok(())
}

#[test]
fn test_version_after_tag() -> Result<()> {
  let ws = go_driver()?;
  ws.tag("go/v1.2.0")?;
  ws.write("go/driver.go", "package driver\n")?;
  let head = ws.commit("fix(go): handle nulls")?;

  let output = run_cli(&ws.path, &["version", "go"])?;
  let version = stdout(&output).trim().to_string();
  let short = version.strip_prefix("v1.2.0-dev.1.").unwrap_or_default();
  assert!(!short.is_empty() && head.starts_with(short), "{}", version);

  let output = run_cli_unchecked(&ws.path, &["version", "go", "--strict"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("is not on tag go/v1.2.0"));

  Ok(())
}

#[test]
fn test_version_dirty_tree() -> Result<()> {
  let ws = go_driver()?;
  ws.tag("go/v1.2.0")?;

  // untracked files do not count
  ws.write("go/scratch.txt", "notes\n")?;
  let output = run_cli(&ws.path, &["version", "go"])?;
  assert_eq!(stdout(&output).trim(), "v1.2.0");

  ws.write("go/go.mod", "module github.com/adbc-drivers/example/go\n\ngo 1.24\n")?;
  let output = run_cli(&ws.path, &["version", "go"])?;
  assert_eq!(stdout(&output).trim(), "v1.2.0-dirty");

  let output = run_cli_unchecked(&ws.path, &["version", "go", "--strict"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("uncommitted changes"));

  Ok(())
}

#[test]
fn test_version_without_tags() -> Result<()> {
  let ws = go_driver()?;
  ws.tag("rust/v9.9.9")?;

  let output = run_cli(&ws.path, &["version", "go"])?;
  assert_eq!(stdout(&output).trim(), "unknown");

  let output = run_cli_unchecked(&ws.path, &["version", "go", "--strict"])?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("No tags matching 'go/v*'"));

  Ok(())
}

#[test]
fn test_version_root_driver() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write("Cargo.toml", "[package]\nname = \"adbc_driver_example\"\n")?;
  ws.commit("feat: add driver")?;
  ws.tag("v0.3.1")?;
  ws.tag("go/v5.0.0")?;

  let output = run_cli(&ws.path, &["version", "."])?;
  assert_eq!(stdout(&output).trim(), "v0.3.1");

  Ok(())
}

#[test]
fn test_version_requires_manifest() -> Result<()> {
  let ws = TestWorkspace::new()?;
  std::fs::create_dir_all(ws.path.join("docs"))?;

  let output = run_cli_unchecked(&ws.path, &["version", "docs"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("does not contain a Cargo.toml or go.mod"));

  Ok(())
}
