//! generate.toml: the declarative description of a driver repository's CI
//!
//! The file is parsed into an ordered value tree and validated by hand so that
//! every rejection names the offending table and key. Shorthand forms
//! (`lang.go = true`, `SECRET = "NAME"`) are resolved once here; templates
//! only ever see the normalized projection from [`GenerateConfig::to_context`].

use crate::core::error::{DevError, DevResult, ResultExt, SchemaError};
use crate::core::secrets::{self, Permissions, ProjectedSecrets, SecretSpec, WorkflowContext};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::fs;
use std::path::{Path, PathBuf};

/// Location of the config file relative to the repository root
pub const CONFIG_PATH: &str = ".github/workflows/generate.toml";

/// Driver name used when generate.toml does not set one
pub const DEFAULT_DRIVER: &str = "(unknown)";

/// Build settings for one language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LangBuildConfig {
  /// Extra arguments for the build entry point
  pub additional_make_args: Vec<String>,
  /// Toolchains to install for the build
  pub lang_tools: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LangConfig {
  pub build: LangBuildConfig,
  /// Skip the validation suite in CI (temporary, while bringing up a driver)
  pub skip_validate: bool,
}

/// One `[lang]` entry after shorthand resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LangSetting {
  /// `false`
  Disabled,
  /// `true`
  Default,
  /// An explicit table
  Explicit(LangConfig),
}

impl LangSetting {
  /// The effective config, or `None` when disabled
  pub fn config(&self) -> Option<LangConfig> {
    match self {
      LangSetting::Disabled => None,
      LangSetting::Default => Some(LangConfig::default()),
      LangSetting::Explicit(config) => Some(config.clone()),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwsConfig {
  pub region: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationConfig {
  /// Extra packages for the validation environment, passed through verbatim
  pub extra_dependencies: IndexMap<String, Value>,
}

/// Validated generate.toml
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateConfig {
  pub driver: String,
  pub environment: Option<String>,
  pub private: bool,
  pub lang: IndexMap<String, LangSetting>,
  pub secrets: IndexMap<String, SecretSpec>,
  pub aws: Option<AwsConfig>,
  pub gcloud: bool,
  pub validation: ValidationConfig,
}

impl Default for GenerateConfig {
  fn default() -> Self {
    Self {
      driver: DEFAULT_DRIVER.to_string(),
      environment: None,
      private: false,
      lang: IndexMap::new(),
      secrets: IndexMap::new(),
      aws: None,
      gcloud: false,
      validation: ValidationConfig::default(),
    }
  }
}

const ROOT_KEYS: &[&str] = &[
  "driver",
  "environment",
  "private",
  "lang",
  "secrets",
  "aws",
  "gcloud",
  "validation",
];
const LANG_KEYS: &[&str] = &["build", "skip_validate", "skip-validate"];
const LANG_BUILD_KEYS: &[&str] = &["additional_make_args", "additional-make-args", "lang_tools", "lang-tools"];
const SECRET_KEYS: &[&str] = &["secret", "contexts"];
const AWS_KEYS: &[&str] = &["region"];
const VALIDATION_KEYS: &[&str] = &["extra_dependencies", "extra-dependencies"];

impl GenerateConfig {
  /// Path of generate.toml inside a repository
  pub fn path_in(repo: &Path) -> PathBuf {
    repo.join(CONFIG_PATH)
  }

  /// Read and validate generate.toml
  pub fn load(path: &Path) -> DevResult<Self> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Self::from_toml_str(&content).map_err(|e| match e {
      DevError::Schema(_) => e,
      other => other.context(format!("Failed to parse {}", path.display())),
    })
  }

  /// Parse TOML text and validate it
  pub fn from_toml_str(content: &str) -> DevResult<Self> {
    let value: Value = toml_edit::de::from_str(content)?;
    Ok(Self::from_value(&value)?)
  }

  /// Validate an already-parsed tree
  pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
    let root = expect_table(value, "")?;
    reject_unknown(root, "", ROOT_KEYS)?;

    let mut config = GenerateConfig::default();

    if let Some(driver) = root.get("driver") {
      config.driver = expect_string(driver, "driver")?.to_string();
    }

    match root.get("environment") {
      None | Some(Value::Null) => {}
      Some(value) => {
        let environment = expect_string(value, "environment")?;
        if environment.trim().is_empty() {
          return Err(SchemaError::InvalidValue {
            path: "environment".to_string(),
            message: "must be non-empty if provided".to_string(),
          });
        }
        config.environment = Some(environment.to_string());
      }
    }

    if let Some(private) = root.get("private") {
      config.private = expect_bool(private, "private")?;
    }
    if let Some(gcloud) = root.get("gcloud") {
      config.gcloud = expect_bool(gcloud, "gcloud")?;
    }

    if let Some(lang) = root.get("lang") {
      for (name, value) in expect_table(lang, "lang")? {
        let path = join("lang", name);
        config.lang.insert(name.clone(), parse_lang(value, &path)?);
      }
    }

    if let Some(secrets) = root.get("secrets") {
      for (variable, value) in expect_table(secrets, "secrets")? {
        let path = join("secrets", variable);
        config.secrets.insert(variable.clone(), parse_secret(value, &path)?);
      }
    }

    match root.get("aws") {
      None | Some(Value::Null) => {}
      Some(value) => {
        let table = expect_table(value, "aws")?;
        reject_unknown(table, "aws", AWS_KEYS)?;
        let region = table.get("region").ok_or_else(|| SchemaError::MissingKey {
          path: "aws".to_string(),
          key: "region".to_string(),
        })?;
        config.aws = Some(AwsConfig {
          region: expect_string(region, "aws.region")?.to_string(),
        });
      }
    }

    if let Some(validation) = root.get("validation") {
      let table = expect_table(validation, "validation")?;
      reject_unknown(table, "validation", VALIDATION_KEYS)?;
      if let Some(deps) = aliased(table, "validation", "extra_dependencies", "extra-dependencies")? {
        let deps = expect_table(deps, "validation.extra_dependencies")?;
        config.validation.extra_dependencies = deps.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
      }
    }

    Ok(config)
  }

  /// Enabled languages with their effective config, in declaration order
  pub fn enabled_langs(&self) -> impl Iterator<Item = (&str, LangConfig)> {
    self
      .lang
      .iter()
      .filter_map(|(name, setting)| setting.config().map(|config| (name.as_str(), config)))
  }

  pub fn projected_secrets(&self) -> ProjectedSecrets {
    secrets::project(&self.secrets, self.aws.is_some(), self.gcloud, self.private)
  }

  pub fn permissions(&self) -> Permissions {
    Permissions::derive(self.aws.is_some(), self.gcloud)
  }

  /// The normalized projection handed to templates
  pub fn to_context(&self) -> Value {
    let lang: Map<String, Value> = self
      .enabled_langs()
      .map(|(name, config)| (name.to_string(), json!(config)))
      .collect();

    json!({
      "driver": self.driver,
      "environment": self.environment,
      "private": self.private,
      "lang": lang,
      "secrets": self.projected_secrets(),
      "permissions": self.permissions(),
      "aws": self.aws,
      "gcloud": self.gcloud,
      "validation": self.validation,
    })
  }

  /// Input-form tree: re-validating it yields an equal config
  pub fn to_value(&self) -> Value {
    let mut root = Map::new();
    root.insert("driver".into(), json!(self.driver));
    if let Some(environment) = &self.environment {
      root.insert("environment".into(), json!(environment));
    }
    root.insert("private".into(), json!(self.private));

    let lang: Map<String, Value> = self
      .lang
      .iter()
      .map(|(name, setting)| {
        let value = match setting {
          LangSetting::Disabled => json!(false),
          LangSetting::Default => json!(true),
          LangSetting::Explicit(config) => json!(config),
        };
        (name.clone(), value)
      })
      .collect();
    root.insert("lang".into(), Value::Object(lang));

    let secrets: Map<String, Value> = self
      .secrets
      .iter()
      .map(|(variable, spec)| {
        let value = match spec {
          SecretSpec::Shared(secret) => json!(secret),
          SecretSpec::Scoped { secret, contexts } => json!({ "secret": secret, "contexts": contexts }),
        };
        (variable.clone(), value)
      })
      .collect();
    root.insert("secrets".into(), Value::Object(secrets));

    if let Some(aws) = &self.aws {
      root.insert("aws".into(), json!(aws));
    }
    root.insert("gcloud".into(), json!(self.gcloud));
    root.insert("validation".into(), json!(self.validation));
    Value::Object(root)
  }

  /// Serialize back to TOML
  pub fn to_toml_string(&self) -> DevResult<String> {
    Ok(toml_edit::ser::to_string_pretty(&self.to_value())?)
  }
}

/// Contents written when a repository has no generate.toml yet
pub fn defaults_document() -> String {
  let mut doc = toml_edit::DocumentMut::new();
  doc["driver"] = toml_edit::value(DEFAULT_DRIVER);
  doc["private"] = toml_edit::value(false);
  doc["gcloud"] = toml_edit::value(false);
  doc["lang"] = toml_edit::table();
  doc.to_string()
}

fn parse_lang(value: &Value, path: &str) -> Result<LangSetting, SchemaError> {
  let table = match value {
    Value::Bool(true) => return Ok(LangSetting::Default),
    Value::Bool(false) | Value::Null => return Ok(LangSetting::Disabled),
    Value::Object(table) => table,
    other => {
      return Err(SchemaError::InvalidType {
        path: path.to_string(),
        expected: "a boolean or a table",
        found: type_name(other).to_string(),
      });
    }
  };
  reject_unknown(table, path, LANG_KEYS)?;

  let mut config = LangConfig::default();
  if let Some(skip) = aliased(table, path, "skip_validate", "skip-validate")? {
    config.skip_validate = expect_bool(skip, &join(path, "skip_validate"))?;
  }
  if let Some(build) = table.get("build") {
    let build_path = join(path, "build");
    let build = expect_table(build, &build_path)?;
    reject_unknown(build, &build_path, LANG_BUILD_KEYS)?;
    if let Some(args) = aliased(build, &build_path, "additional_make_args", "additional-make-args")? {
      config.build.additional_make_args = expect_string_list(args, &join(&build_path, "additional_make_args"))?;
    }
    if let Some(tools) = aliased(build, &build_path, "lang_tools", "lang-tools")? {
      config.build.lang_tools = expect_string_list(tools, &join(&build_path, "lang_tools"))?;
    }
  }
  Ok(LangSetting::Explicit(config))
}

fn parse_secret(value: &Value, path: &str) -> Result<SecretSpec, SchemaError> {
  let table = match value {
    Value::String(secret) => return Ok(SecretSpec::Shared(secret.clone())),
    Value::Object(table) => table,
    other => {
      return Err(SchemaError::InvalidType {
        path: path.to_string(),
        expected: "a string or a table",
        found: type_name(other).to_string(),
      });
    }
  };
  reject_unknown(table, path, SECRET_KEYS)?;

  let secret = table.get("secret").ok_or_else(|| SchemaError::MissingKey {
    path: path.to_string(),
    key: "secret".to_string(),
  })?;
  let secret = expect_string(secret, &join(path, "secret"))?.to_string();

  let contexts = match table.get("contexts") {
    None => WorkflowContext::ALL.to_vec(),
    Some(value) => {
      let contexts_path = join(path, "contexts");
      let mut contexts = Vec::new();
      for name in expect_string_list(value, &contexts_path)? {
        let context = WorkflowContext::parse(&name).ok_or_else(|| SchemaError::UnknownContext {
          path: contexts_path.clone(),
          context: name.clone(),
        })?;
        if !contexts.contains(&context) {
          contexts.push(context);
        }
      }
      contexts
    }
  };

  Ok(SecretSpec::Scoped { secret, contexts })
}

fn join(path: &str, key: &str) -> String {
  if path.is_empty() {
    key.to_string()
  } else {
    format!("{}.{}", path, key)
  }
}

fn type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "boolean",
    Value::Number(n) if n.is_f64() => "float",
    Value::Number(_) => "integer",
    Value::String(_) => "string",
    Value::Array(_) => "array",
    Value::Object(_) => "table",
  }
}

fn expect_table<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, SchemaError> {
  value.as_object().ok_or_else(|| SchemaError::InvalidType {
    path: path.to_string(),
    expected: "a table",
    found: type_name(value).to_string(),
  })
}

fn expect_string<'a>(value: &'a Value, path: &str) -> Result<&'a str, SchemaError> {
  value.as_str().ok_or_else(|| SchemaError::InvalidType {
    path: path.to_string(),
    expected: "a string",
    found: type_name(value).to_string(),
  })
}

fn expect_bool(value: &Value, path: &str) -> Result<bool, SchemaError> {
  value.as_bool().ok_or_else(|| SchemaError::InvalidType {
    path: path.to_string(),
    expected: "a boolean",
    found: type_name(value).to_string(),
  })
}

fn expect_string_list(value: &Value, path: &str) -> Result<Vec<String>, SchemaError> {
  let items = value.as_array().ok_or_else(|| SchemaError::InvalidType {
    path: path.to_string(),
    expected: "an array of strings",
    found: type_name(value).to_string(),
  })?;
  items
    .iter()
    .enumerate()
    .map(|(i, item)| expect_string(item, &format!("{}[{}]", path, i)).map(str::to_string))
    .collect()
}

fn reject_unknown(table: &Map<String, Value>, path: &str, allowed: &[&str]) -> Result<(), SchemaError> {
  let unknown: Vec<String> = table
    .keys()
    .filter(|key| !allowed.contains(&key.as_str()))
    .cloned()
    .collect();
  if unknown.is_empty() {
    Ok(())
  } else {
    Err(SchemaError::UnknownKeys {
      path: path.to_string(),
      keys: unknown,
    })
  }
}

/// Look up a key that may be spelled with `_` or `-`, but not both
fn aliased<'a>(
  table: &'a Map<String, Value>,
  path: &str,
  name: &str,
  alias: &str,
) -> Result<Option<&'a Value>, SchemaError> {
  match (table.get(name), table.get(alias)) {
    (Some(_), Some(_)) => Err(SchemaError::InvalidValue {
      path: join(path, name),
      message: format!("is also set as `{}`; use only one spelling", alias),
    }),
    (Some(value), None) | (None, Some(value)) => Ok(Some(value)),
    (None, None) => Ok(None),
  }
}
