//! Integration tests for `release`

use crate::helpers::{TestWorkspace, run_cli, run_cli_unchecked, stdout};
use anyhow::Result;

#[test]
fn test_release_dry_run() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write("go/manifest.toml", "name = \"DuckDB\"\n")?;
  ws.write("go/go.mod", "module github.com/adbc-drivers/duckdb/go\n")?;
  ws.commit("feat(go): initial driver")?;
  ws.tag("go/v0.9.0")?;
  ws.tag("go/v1.0.0")?;

  ws.write("go/ingest.go", "package driver\n")?;
  ws.commit("perf(go): faster ingest")?;
  ws.tag("go/v1.1.0")?;
  ws.tag("go/v2.0.0")?;

  let output = run_cli(&ws.path, &["release", ".", "go/v1.1.0", "--dry-run"])?;
  let text = stdout(&output);

  assert!(text.starts_with("# DuckDB 1.1.0 ("), "{}", text);
  assert!(text.contains("## Performance Improvements\n\n- faster ingest"), "{}", text);
  assert!(!text.contains("initial driver"), "{}", text);
  assert!(text.contains("* gh release create go/v1.1.0 --draft --title DuckDB 1.1.0"), "{}", text);
  assert!(text.contains("--verify-tag --notes-file"), "{}", text);
  assert!(text.contains("Dry run, not actually releasing"), "{}", text);

  Ok(())
}

#[test]
fn test_release_rejects_bad_tag() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_cli_unchecked(&ws.path, &["release", ".", "go/latest", "--dry-run"])?;
  assert_eq!(output.status.code(), Some(1));

  Ok(())
}
