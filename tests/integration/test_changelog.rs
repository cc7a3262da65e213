//! Integration tests for `changelog`

use crate::helpers::{TestWorkspace, run_cli, run_cli_unchecked, stderr, stdout};
use anyhow::Result;

fn history() -> Result<TestWorkspace> {
  let ws = TestWorkspace::new()?;
  ws.write("go/manifest.toml", "name = \"PostgreSQL\"\n")?;
  ws.write("go/go.mod", "module github.com/adbc-drivers/postgresql/go\n")?;
  ws.commit("feat(go): initial driver")?;
  ws.tag("go/v1.0.0")?;

  ws.write("go/ingest.go", "package driver\n")?;
  ws.commit("feat(go): add bulk ingest")?;
  ws.write("golang/tool.go", "package tool\n")?;
  ws.commit("feat: unrelated golang tool")?;
  ws.write("go/rows.go", "package driver\n")?;
  ws.commit("fix(go): close rows")?;
  ws.write("go/README.md", "# PostgreSQL\n")?;
  ws.commit("random tweak")?;
  Ok(ws)
}

#[test]
fn test_changelog_for_subdirectory() -> Result<()> {
  let ws = history()?;

  let output = run_cli(
    &ws.path,
    &["changelog", ".", "go", "1.1.0", "--from", "go/v1.0.0", "--to", "HEAD"],
  )?;
  let text = stdout(&output);

  assert!(text.starts_with("# PostgreSQL 1.1.0 ("), "{}", text);
  assert!(text.contains("## New Features\n\n- add bulk ingest\n"), "{}", text);
  assert!(text.contains("## Bug Fixes\n\n- close rows\n"), "{}", text);
  assert!(!text.contains("golang tool"), "{}", text);
  assert!(!text.contains("initial driver"), "{}", text);

  let detailed = text.split("## Detailed Changelog").nth(1).unwrap_or_default();
  let lines: Vec<&str> = detailed.lines().filter(|l| l.starts_with("- ")).collect();
  assert_eq!(lines.len(), 3);
  assert!(lines[0].ends_with(": random tweak"));
  assert!(lines[2].ends_with(": feat(go): add bulk ingest"));

  Ok(())
}

#[test]
fn test_changelog_from_beginning() -> Result<()> {
  let ws = history()?;

  let output = run_cli(&ws.path, &["changelog", ".", "go", "1.1.0", "--to", "HEAD"])?;
  let text = stdout(&output);
  assert!(text.contains("- initial driver"), "{}", text);

  Ok(())
}

#[test]
fn test_changelog_requires_manifest() -> Result<()> {
  let ws = history()?;

  let output = run_cli_unchecked(&ws.path, &["changelog", ".", "rust", "0.1.0", "--to", "HEAD"])?;
  assert!(!output.status.success());
  assert!(stderr(&output).contains("rust/manifest.toml not found"));

  Ok(())
}
