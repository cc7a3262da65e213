//! Integration tests for `validation`

use crate::helpers::{TestWorkspace, run_cli, run_cli_unchecked, stderr, stdout};
use anyhow::{Context, Result};
use std::io::Write;
use std::process::{Command, Stdio};

#[test]
fn test_validation_init_creates_scaffold() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_cli(&ws.path, &["validation", "init", "--driver-id", "duck_db"])?;
  let out = stdout(&output);
  assert!(out.contains("Driver ID: duck_db"), "{}", out);
  assert!(out.contains("build/libadbc_driver_duck_db.{so,dylib,dll}"), "{}", out);

  for file in [
    "validation/pytest.ini",
    "validation/README.md",
    "validation/driver-template.md",
    "validation/queries/type/select/.gitkeep",
    "validation/tests/__init__.py",
    "validation/tests/conftest.py",
    "validation/tests/duck_db.py",
    "validation/tests/generate_documentation.py",
    "validation/tests/test_connection.py",
    "validation/tests/test_statement.py",
    "validation/tests/duck_db/test_uri.py",
  ] {
    assert!(ws.file_exists(file), "missing {}", file);
  }
  let suite = ws.read_file("validation/tests/test_query.py")?;
  assert!(suite.contains("ADBC Drivers Contributors"));
  assert!(suite.contains("duck_db"));

  // a second init must not clobber the first
  let output = run_cli_unchecked(&ws.path, &["validation", "init", "--driver-id", "other"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("already exists"));
  assert!(!ws.file_exists("validation/tests/other.py"));

  Ok(())
}

#[test]
fn test_validation_init_rejects_invalid_id() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let output = run_cli_unchecked(&ws.path, &["validation", "init", "--driver-id", "Duck-DB"])?;
  assert!(!output.status.success());
  assert!(stderr(&output).contains("Invalid driver ID: Duck-DB"));
  assert!(!ws.file_exists("validation"));
  Ok(())
}

#[test]
fn test_validation_init_prompts_for_id() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let mut child = Command::new(env!("CARGO_BIN_EXE_adbc-drivers-dev"))
    .current_dir(&ws.path)
    .args(["validation", "init"])
    .stdin(Stdio::piped())
    .stdout(Stdio::piped())
    .stderr(Stdio::piped())
    .spawn()
    .context("Failed to run adbc-drivers-dev")?;
  child
    .stdin
    .take()
    .context("stdin not piped")?
    .write_all(b"Not Valid\nsnowflake\n")?;
  let output = child.wait_with_output()?;

  assert!(output.status.success(), "{}", stderr(&output));
  assert!(stdout(&output).contains("Driver ID: snowflake"));
  assert!(ws.file_exists("validation/tests/snowflake.py"));
  Ok(())
}

#[test]
fn test_validation_run_without_scaffold() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_cli_unchecked(&ws.path, &["validation", "run", "-k", "test_uri"])?;
  assert!(!output.status.success());
  assert!(stderr(&output).contains("validation init"));

  let output = run_cli_unchecked(&ws.path, &["validation", "docs"])?;
  assert!(!output.status.success());
  assert!(stderr(&output).contains("validation init"));
  Ok(())
}
