use crate::core::error::{DevError, DevResult};
use crate::core::schema::generate_schema;
use crate::workflow::actions::{ActionUpdater, GitHubTags};
use crate::workflow::generate::generate;
use std::path::Path;

/// Render workflows for the repository at `repo`
pub fn run_generate(repo: &Path) -> DevResult<()> {
  let report = generate(repo)?;
  if report.missing_license_templates.is_empty() {
    return Ok(());
  }
  for path in &report.missing_license_templates {
    eprintln!("Missing {}", path.display());
  }
  Err(DevError::with_help(
    format!(
      "{} enabled language(s) have no license.tpl",
      report.missing_license_templates.len()
    ),
    "Add a go-licenses report template next to each driver's go.mod or Cargo.toml",
  ))
}

/// Print the generate.toml JSON Schema
pub fn run_schema() -> DevResult<()> {
  println!("{}", serde_json::to_string_pretty(&generate_schema())?);
  Ok(())
}

/// Pin every action under `templates` to its newest release
pub fn run_update_actions(templates: &Path) -> DevResult<()> {
  let mut updater = ActionUpdater::new(GitHubTags)?;
  let visited = updater.update_dir(templates)?;
  if visited.is_empty() {
    println!("No templates found under {}", templates.display());
  }
  Ok(())
}
