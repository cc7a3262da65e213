//! Embedded Tera templates for generated workflows and per-language files

use crate::core::error::DevResult;
use serde_json::Value;
use std::collections::HashMap;
use tera::{Context, Tera};

/// Template name and source, compiled into the binary
const TEMPLATES: &[(&str, &str)] = &[
  ("test.yaml", include_str!("templates/test.yaml")),
  ("dev.yaml", include_str!("templates/dev.yaml")),
  ("dev_issues.yaml", include_str!("templates/dev_issues.yaml")),
  ("dev_pr.yaml", include_str!("templates/dev_pr.yaml")),
  ("dev_pr_secrets.yaml", include_str!("templates/dev_pr_secrets.yaml")),
  ("pixi.toml", include_str!("templates/pixi.toml")),
  ("golangci.yaml", include_str!("templates/golangci.yaml")),
];

/// Renders the embedded templates against a config projection
#[derive(Debug)]
pub struct WorkflowRenderer {
  tera: Tera,
}

impl WorkflowRenderer {
  pub fn new() -> DevResult<Self> {
    let mut tera = Tera::default();
    tera.add_raw_templates(TEMPLATES.to_vec())?;
    tera.register_filter("toml_value", toml_value);
    Ok(Self { tera })
  }

  /// Render `template` with `context` (the config projection) merged with `extra`
  ///
  /// The result always ends with a newline.
  pub fn render(&self, template: &str, context: &Value, extra: &Value) -> DevResult<String> {
    let mut ctx = Context::from_value(context.clone())?;
    if let Value::Object(extra) = extra {
      for (key, value) in extra {
        ctx.insert(key.as_str(), value);
      }
    }
    let mut rendered = self.tera.render(template, &ctx)?;
    if !rendered.ends_with('\n') {
      rendered.push('\n');
    }
    Ok(rendered)
  }
}

/// Format a JSON value as an inline TOML value
fn toml_value(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
  Ok(Value::String(inline_toml(value)))
}

fn inline_toml(value: &Value) -> String {
  match value {
    Value::Null => "\"\"".to_string(),
    Value::Bool(b) => b.to_string(),
    Value::Number(n) => n.to_string(),
    Value::String(s) => toml_edit::Value::from(s.as_str()).to_string().trim().to_string(),
    Value::Array(items) => format!("[{}]", items.iter().map(inline_toml).collect::<Vec<_>>().join(", ")),
    Value::Object(map) => {
      let fields: Vec<String> = map
        .iter()
        .map(|(key, value)| format!("{} = {}", toml_key(key), inline_toml(value)))
        .collect();
      format!("{{ {} }}", fields.join(", "))
    }
  }
}

fn toml_key(key: &str) -> String {
  let bare = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
  if bare {
    key.to_string()
  } else {
    toml_edit::Value::from(key).to_string().trim().to_string()
  }
}
