//! Integration tests for `generate` and `schema`

use crate::helpers::{TestWorkspace, run_cli, run_cli_unchecked, stderr, stdout};
use anyhow::Result;

const CONFIG: &str = r#"
driver = "postgresql"
environment = "ci"

[lang]
go = true

[secrets]
PG_URI = { secret = "PG_URI_SECRET", contexts = ["test"] }
"#;

#[test]
fn test_generate_writes_workflows() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write(".github/workflows/generate.toml", CONFIG)?;
  ws.write("go/license.tpl", "{{ range . }}{{ .Name }}{{ end }}\n")?;

  let output = run_cli(&ws.path, &["generate", "."])?;
  let text = stdout(&output);
  assert!(text.contains("Wrote"), "{}", text);

  for path in [
    ".github/workflows/go_test.yaml",
    ".github/workflows/go_release.yaml",
    ".github/workflows/dev.yaml",
    ".github/workflows/dev_issues.yaml",
    ".github/workflows/dev_pr.yaml",
    ".github/workflows/dev_pr_secrets.yaml",
    "go/pixi.toml",
    "go/.golangci.yaml",
  ] {
    assert!(ws.file_exists(path), "{} was not written", path);
    let content = ws.read_file(path)?;
    assert!(content.ends_with('\n'), "{} lacks a trailing newline", path);
    if path.ends_with(".yaml") {
      serde_yaml::from_str::<serde_yaml::Value>(&content)?;
    }
  }
  assert!(!ws.file_exists(".github/workflows/rust_test.yaml"));

  let test = ws.read_file(".github/workflows/go_test.yaml")?;
  assert!(test.contains("PG_URI: ${{ secrets.PG_URI_SECRET }}"));

  Ok(())
}

#[test]
fn test_generate_missing_license_template() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write(".github/workflows/generate.toml", CONFIG)?;

  let output = run_cli_unchecked(&ws.path, &["generate", "."])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Missing"), "{}", stderr(&output));
  assert!(stderr(&output).contains("license.tpl"));
  // everything is still written
  assert!(ws.file_exists(".github/workflows/go_test.yaml"));

  Ok(())
}

#[test]
fn test_generate_without_config_writes_defaults() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_cli_unchecked(&ws.path, &["generate", "."])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("not found"));
  assert!(stderr(&output).contains("Wrote out defaults, please fill it in."));

  let defaults = ws.read_file(".github/workflows/generate.toml")?;
  assert!(defaults.contains("driver = \"(unknown)\""));
  assert!(defaults.contains("[lang]"));

  Ok(())
}

#[test]
fn test_generate_rejects_unknown_keys() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write(".github/workflows/generate.toml", "driver = \"pg\"\nbogus = 1\n")?;

  let output = run_cli_unchecked(&ws.path, &["generate", "."])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("`bogus`"), "{}", stderr(&output));
  assert!(!ws.file_exists(".github/workflows/dev.yaml"));

  Ok(())
}

#[test]
fn test_schema_is_json() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_cli(&ws.path, &["schema"])?;
  let schema: serde_json::Value = serde_json::from_str(&stdout(&output))?;
  assert_eq!(schema["$schema"], "http://json-schema.org/draft-07/schema#");
  assert!(schema["properties"]["secrets"].is_object());

  Ok(())
}
