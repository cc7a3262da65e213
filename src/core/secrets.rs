//! Secrets and permissions projected from generate.toml
//!
//! A secret is declared once and made available to one or more workflow
//! contexts. Templates consume the projection: one variable→secret map per
//! context plus an aggregate `all` map, which also carries the fixed secrets
//! implied by cloud authentication and private drivers.

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// The token GitHub injects on its own; declaring it again is rejected by Actions.
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";

/// Secrets implied by `[aws]`
pub const AWS_SECRETS: [&str; 2] = ["AWS_ROLE", "AWS_ROLE_SESSION_NAME"];

/// Secrets implied by `gcloud = true`
pub const GCLOUD_SECRETS: [&str; 2] = ["GCLOUD_SERVICE_ACCOUNT", "GCLOUD_WORKLOAD_IDENTITY_PROVIDER"];

/// Secrets implied by `private = true`
pub const PRIVATE_SECRETS: [&str; 1] = ["COLUMNAR_CLOUD_API_TOKEN"];

/// A CI pipeline phase a secret can be exposed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkflowContext {
  BuildTest,
  BuildRelease,
  Test,
  Validate,
}

impl WorkflowContext {
  /// Every context, in the order projections are built and rendered
  pub const ALL: [WorkflowContext; 4] = [
    WorkflowContext::BuildTest,
    WorkflowContext::BuildRelease,
    WorkflowContext::Test,
    WorkflowContext::Validate,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      WorkflowContext::BuildTest => "build:test",
      WorkflowContext::BuildRelease => "build:release",
      WorkflowContext::Test => "test",
      WorkflowContext::Validate => "validate",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|ctx| ctx.as_str() == s)
  }
}

impl fmt::Display for WorkflowContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl Serialize for WorkflowContext {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_str())
  }
}

/// One `[secrets]` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSpec {
  /// `VAR = "SECRET"`: available in every context
  Shared(String),
  /// `[secrets.VAR]` table with an explicit context list
  Scoped {
    secret: String,
    contexts: Vec<WorkflowContext>,
  },
}

impl SecretSpec {
  /// Name of the upstream GitHub secret
  pub fn secret(&self) -> &str {
    match self {
      SecretSpec::Shared(secret) => secret,
      SecretSpec::Scoped { secret, .. } => secret,
    }
  }

  pub fn applies_to(&self, context: WorkflowContext) -> bool {
    match self {
      SecretSpec::Shared(_) => true,
      SecretSpec::Scoped { contexts, .. } => contexts.contains(&context),
    }
  }
}

/// Variable name → secret name, in declaration order
pub type SecretMap = IndexMap<String, String>;

/// Per-context secret mappings plus the aggregate `all` mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedSecrets {
  contexts: IndexMap<WorkflowContext, SecretMap>,
  all: SecretMap,
}

impl ProjectedSecrets {
  pub fn context(&self, context: WorkflowContext) -> &SecretMap {
    // every context is inserted by project()
    &self.contexts[&context]
  }

  pub fn all(&self) -> &SecretMap {
    &self.all
  }

  /// True when no workflow needs any secret
  pub fn is_empty(&self) -> bool {
    self.all.is_empty()
  }
}

impl Serialize for ProjectedSecrets {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.contexts.len() + 1))?;
    for (context, secrets) in &self.contexts {
      map.serialize_entry(context.as_str(), secrets)?;
    }
    map.serialize_entry("all", &self.all)?;
    map.end()
  }
}

/// Workflow-level permissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Permissions {
  /// OIDC token for cloud federation
  pub id_token: bool,
}

impl Permissions {
  pub fn derive(aws: bool, gcloud: bool) -> Self {
    Self { id_token: aws || gcloud }
  }
}

/// Fold the declared secrets into every context they apply to, then build `all`.
///
/// Cloud and private-driver secrets go into `all` only. Entries whose value is
/// the platform token are dropped from `all`.
pub fn project(secrets: &IndexMap<String, SecretSpec>, aws: bool, gcloud: bool, private: bool) -> ProjectedSecrets {
  let mut contexts: IndexMap<WorkflowContext, SecretMap> =
    WorkflowContext::ALL.into_iter().map(|ctx| (ctx, SecretMap::new())).collect();

  for (variable, spec) in secrets {
    for (context, mapping) in contexts.iter_mut() {
      if spec.applies_to(*context) {
        mapping.insert(variable.clone(), spec.secret().to_string());
      }
    }
  }

  let mut all = SecretMap::new();
  for mapping in contexts.values() {
    for (variable, secret) in mapping {
      all.entry(variable.clone()).or_insert_with(|| secret.clone());
    }
  }

  let mut implied: Vec<&str> = Vec::new();
  if aws {
    implied.extend(AWS_SECRETS);
  }
  if gcloud {
    implied.extend(GCLOUD_SECRETS);
  }
  if private {
    implied.extend(PRIVATE_SECRETS);
  }
  for name in implied {
    all.insert(name.to_string(), name.to_string());
  }

  all.retain(|_, secret| secret != GITHUB_TOKEN);

  ProjectedSecrets { contexts, all }
}
