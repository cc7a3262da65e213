//! `generate`: render CI workflows and per-language files from generate.toml

use super::render::WorkflowRenderer;
use crate::core::config::{self, GenerateConfig, LangConfig};
use crate::core::error::{DevError, DevResult, ResultExt};
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Languages with test/release workflows
pub const WORKFLOW_LANGS: [&str; 2] = ["go", "rust"];

const WORKFLOWS_DIR: &str = ".github/workflows";
const DEV_WORKFLOWS: [&str; 3] = ["dev.yaml", "dev_issues.yaml", "dev_pr.yaml"];
const SECRETS_WORKFLOW: &str = "dev_pr_secrets.yaml";

/// One file to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
  pub path: PathBuf,
  pub content: String,
}

/// Outcome of a generate run
#[derive(Debug, Default)]
pub struct GenerateReport {
  pub written: Vec<PathBuf>,
  /// `<lang>/license.tpl` files an enabled language is missing
  pub missing_license_templates: Vec<PathBuf>,
}

/// Render every output for `config` without touching the filesystem
pub fn render_all(repo: &Path, config: &GenerateConfig) -> DevResult<Vec<RenderedFile>> {
  let renderer = WorkflowRenderer::new()?;
  let context = config.to_context();
  let secrets = config.projected_secrets();
  let workflows = repo.join(WORKFLOWS_DIR);
  let mut files = Vec::new();

  for (lang, lang_config) in config.enabled_langs() {
    if !WORKFLOW_LANGS.contains(&lang) {
      continue;
    }
    for (suffix, release, workflow_name, build_context) in [
      ("test", false, "Test", "build:test"),
      ("release", true, "Release", "build:release"),
    ] {
      let filename = format!("{}_{}.yaml", lang, suffix);
      let extra = json!({
        "workflow_name": workflow_name,
        "release": release,
        "lang_name": lang,
        "lang_title": title_case(lang),
        "lang_config": lang_config,
        "build_secrets": context["secrets"][build_context],
        "pull_request_trigger_paths": [format!("{}/{}", WORKFLOWS_DIR, filename)],
      });
      files.push(RenderedFile {
        path: workflows.join(&filename),
        content: renderer.render("test.yaml", &context, &extra)?,
      });
    }
  }

  for name in DEV_WORKFLOWS {
    files.push(RenderedFile {
      path: workflows.join(name),
      content: renderer.render(name, &context, &json!({}))?,
    });
  }
  if !secrets.is_empty() {
    files.push(RenderedFile {
      path: workflows.join(SECRETS_WORKFLOW),
      content: renderer.render(SECRETS_WORKFLOW, &context, &json!({}))?,
    });
  }

  for (lang, lang_config) in config.enabled_langs() {
    let lang_dir = repo.join(lang);
    files.push(RenderedFile {
      path: lang_dir.join("pixi.toml"),
      content: renderer.render("pixi.toml", &context, &lang_extra(lang, &lang_config))?,
    });
    if lang == "go" {
      files.push(RenderedFile {
        path: lang_dir.join(".golangci.yaml"),
        content: renderer.render("golangci.yaml", &context, &lang_extra(lang, &lang_config))?,
      });
    }
  }

  Ok(files)
}

fn lang_extra(lang: &str, lang_config: &LangConfig) -> Value {
  json!({
    "lang_name": lang,
    "lang_title": title_case(lang),
    "lang_config": lang_config,
  })
}

fn title_case(word: &str) -> String {
  let mut chars = word.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

/// Load generate.toml from `repo` and write every output
///
/// A missing config is replaced by the defaults document and reported as an
/// error so the caller fills it in first.
pub fn generate(repo: &Path) -> DevResult<GenerateReport> {
  let config_path = GenerateConfig::path_in(repo);
  if !config_path.is_file() {
    write_defaults(&config_path)?;
    return Err(DevError::with_help(
      format!("{} not found.", config_path.display()),
      "Wrote out defaults, please fill it in.",
    ));
  }

  let config = GenerateConfig::load(&config_path)?;
  info!("Generating workflows for driver {}", config.driver);
  match config.to_toml_string() {
    Ok(normalized) => debug!("Normalized config:\n{}", normalized),
    Err(e) => debug!("Could not serialize normalized config: {}", e),
  }

  let mut report = GenerateReport::default();
  for file in render_all(repo, &config)? {
    if let Some(parent) = file.path.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&file.path, &file.content).with_context(|| format!("Failed to write {}", file.path.display()))?;
    println!("Wrote {}", file.path.display());
    report.written.push(file.path);
  }

  for (lang, _) in config.enabled_langs() {
    let license_template = repo.join(lang).join("license.tpl");
    if !license_template.is_file() {
      report.missing_license_templates.push(license_template);
    }
  }

  Ok(report)
}

fn write_defaults(path: &Path) -> DevResult<()> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
  }
  fs::write(path, config::defaults_document()).with_context(|| format!("Failed to write {}", path.display()))
}
