//! Integration tests for `package`

use crate::helpers::{TestWorkspace, run_cli, run_cli_unchecked, stderr, stdout};
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const MANIFEST_TEMPLATE: &str = r#"name = "PostgreSQL"
description = "An ADBC driver for PostgreSQL"
publisher = "ADBC Drivers Contributors"
license = "Apache-2.0"
version = "{VERSION}"

[Files]
driver = "{DRIVER}"
"#;

/// A tagged Go driver plus CI artifacts for two platforms
fn driver_with_artifacts() -> Result<TestWorkspace> {
  let ws = TestWorkspace::new()?;
  ws.write("go/go.mod", "module github.com/adbc-drivers/postgresql/go\n")?;
  ws.write("go/manifest.toml", MANIFEST_TEMPLATE)?;
  ws.write("go/LICENSE.txt", "Apache License\nVersion 2.0\n")?;
  ws.commit("feat(go): add driver")?;
  ws.tag("go/v1.0.0")?;

  ws.write("drivers-linux-amd64/libadbc_driver_pg.so", "ELF")?;
  ws.write("drivers-linux-amd64/libadbc_driver_other.so", "ELF")?;
  ws.write("drivers-macos_11_0-arm64/nested/libadbc_driver_pg.dylib", "MACHO")?;
  Ok(ws)
}

fn archive_entries(path: &Path) -> Result<Vec<(String, String)>> {
  let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
  let mut archive = tar::Archive::new(GzDecoder::new(file));
  let mut entries = Vec::new();
  for entry in archive.entries()? {
    let mut entry = entry?;
    let name = entry.path()?.to_string_lossy().to_string();
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    entries.push((name, content));
  }
  Ok(entries)
}

const PACKAGE_ARGS: [&str; 10] = [
  "package",
  "--output",
  "out",
  "--name",
  "pg",
  "--root",
  "go",
  "--manifest-template",
  "go/manifest.toml",
  "drivers-linux-amd64",
];

#[test]
fn test_package_writes_archives_and_index() -> Result<()> {
  let ws = driver_with_artifacts()?;

  let mut args = PACKAGE_ARGS.to_vec();
  args.extend(["drivers-macos_11_0-arm64", "--release"]);
  let output = run_cli(&ws.path, &args)?;
  let out = stdout(&output);
  assert!(out.contains("Generating pg linux amd64 v1.0.0"), "{}", out);
  assert!(out.contains("Generated manifest.yaml"), "{}", out);

  let linux = ws.path.join("out/pg/v1.0.0/pg_linux_amd64_v1.0.0.tar.gz");
  let entries = archive_entries(&linux)?;
  let names: Vec<&str> = entries.iter().map(|(name, _)| name.as_str()).collect();
  assert_eq!(names, ["libadbc_driver_pg.so", "MANIFEST", "LICENSE"]);

  let manifest: toml_edit::DocumentMut = entries[1].1.parse()?;
  assert_eq!(manifest["version"].as_str(), Some("v1.0.0"));
  assert_eq!(manifest["Files"]["driver"].as_str(), Some("libadbc_driver_pg.so"));
  assert_eq!(entries[2].1, "Apache License\nVersion 2.0\n");

  assert!(ws.file_exists("out/pg/v1.0.0/pg_macos_arm64_v1.0.0.tar.gz"));
  assert!(!ws.file_exists("out/other"));

  let index: serde_yaml::Value = serde_yaml::from_str(&ws.read_file("out/manifest.yaml")?)?;
  let driver = &index["drivers"][0];
  assert_eq!(driver["name"].as_str(), Some("PostgreSQL"));
  assert_eq!(driver["path"].as_str(), Some("pg"));
  let pkginfo = &driver["pkginfo"][0];
  assert_eq!(pkginfo["version"].as_str(), Some("v1.0.0"));
  assert_eq!(pkginfo["packages"][0]["platform"].as_str(), Some("linux_amd64"));
  assert_eq!(
    pkginfo["packages"][1]["url"].as_str(),
    Some("pg/v1.0.0/pg_macos_arm64_v1.0.0.tar.gz")
  );

  Ok(())
}

#[test]
fn test_package_is_reproducible() -> Result<()> {
  let ws = driver_with_artifacts()?;

  run_cli(&ws.path, &PACKAGE_ARGS)?;
  let first = std::fs::read(ws.path.join("out/pg/v1.0.0/pg_linux_amd64_v1.0.0.tar.gz"))?;
  run_cli(&ws.path, &PACKAGE_ARGS)?;
  let second = std::fs::read(ws.path.join("out/pg/v1.0.0/pg_linux_amd64_v1.0.0.tar.gz"))?;
  assert_eq!(first, second);

  Ok(())
}

#[test]
fn test_package_release_requires_tag() -> Result<()> {
  let ws = driver_with_artifacts()?;
  ws.write("go/driver.go", "package driver\n")?;
  ws.commit("fix(go): handle nulls")?;

  // development builds get a dev version
  run_cli(&ws.path, &PACKAGE_ARGS)?;

  let mut args = PACKAGE_ARGS.to_vec();
  args.push("--release");
  let output = run_cli_unchecked(&ws.path, &args)?;
  assert_eq!(output.status.code(), Some(3));
  assert!(stderr(&output).contains("is not on tag go/v1.0.0"));

  Ok(())
}

#[test]
fn test_package_rejects_bad_input_directory() -> Result<()> {
  let ws = driver_with_artifacts()?;
  ws.write("artifacts/libadbc_driver_pg.so", "ELF")?;

  let mut args = PACKAGE_ARGS.to_vec();
  args[9] = "artifacts";
  let output = run_cli_unchecked(&ws.path, &args)?;
  assert!(!output.status.success());
  assert!(stderr(&output).contains("artifacts"), "{}", stderr(&output));

  Ok(())
}

#[test]
fn test_package_requires_license() -> Result<()> {
  let ws = driver_with_artifacts()?;
  std::fs::remove_file(ws.path.join("go/LICENSE.txt"))?;

  let output = run_cli_unchecked(&ws.path, &PACKAGE_ARGS)?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("LICENSE is missing"));

  Ok(())
}
