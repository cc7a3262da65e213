//! Integration tests for `copyright`

use crate::helpers::{TestWorkspace, run_cli, run_cli_unchecked, stderr, stdout};
use anyhow::Result;
use chrono::Datelike;

fn header(comment: &str) -> String {
  format!(
    "{} Copyright (c) {} Columnar Technologies Inc.  All rights reserved.\n",
    comment,
    chrono::Local::now().year()
  )
}

fn repo_with_headers() -> Result<TestWorkspace> {
  let ws = TestWorkspace::new()?;
  ws.write(".rat-excludes", "# not source\n.rat-excludes\nREADME.md\n*.png\n")?;
  ws.write("go/driver.go", &format!("{}\npackage driver\n", header("//")))?;
  ws.write("ci/check.py", &format!("#!/usr/bin/env python3\n{}", header("#")))?;
  ws.write("docs/logo.png", "PNG")?;
  ws.write("go/empty.txt", "")?;
  ws.commit("chore: add sources")?;
  Ok(ws)
}

#[test]
fn test_copyright_clean_repository() -> Result<()> {
  let ws = repo_with_headers()?;
  let output = run_cli(&ws.path, &["copyright"])?;
  assert!(stdout(&output).is_empty(), "{}", stdout(&output));
  Ok(())
}

#[test]
fn test_copyright_exit_code_counts_findings() -> Result<()> {
  let ws = repo_with_headers()?;
  ws.write("go/new.go", "package driver\n")?;
  ws.write("go/old.go", "// Copyright (c) 2019 Columnar Technologies Inc. All rights reserved.\n")?;
  ws.commit("feat(go): more files")?;

  let output = run_cli_unchecked(&ws.path, &["copyright"])?;
  assert_eq!(output.status.code(), Some(2));
  let out = stdout(&output);
  assert!(out.contains("Missing copyright header in go/new.go"), "{}", out);
  assert!(out.contains("Missing copyright header in go/old.go"), "{}", out);
  assert!(stderr(&output).contains("2 problem(s) found"));
  Ok(())
}

#[test]
fn test_copyright_sees_uncommitted_changes() -> Result<()> {
  let ws = repo_with_headers()?;
  ws.write("go/driver.go", "package driver\n")?;
  // untracked files are not part of the snapshot
  ws.write("go/scratch.go", "package driver\n")?;

  let output = run_cli_unchecked(&ws.path, &["copyright"])?;
  assert_eq!(output.status.code(), Some(1));
  let out = stdout(&output);
  assert!(out.contains("go/driver.go"), "{}", out);
  assert!(!out.contains("go/scratch.go"), "{}", out);
  Ok(())
}

#[test]
fn test_copyright_custom_holder() -> Result<()> {
  let ws = repo_with_headers()?;
  let output = run_cli_unchecked(&ws.path, &["copyright", ".", "--holder", "ADBC Drivers Contributors"])?;
  assert_eq!(output.status.code(), Some(2));
  Ok(())
}
