//! JSON Schema (draft-07) for generate.toml
//!
//! Editors and TOML linters can validate generate.toml against this with a
//! `#:schema` directive. It describes the same shape [`GenerateConfig`] accepts.
//!
//! [`GenerateConfig`]: crate::core::config::GenerateConfig

use crate::core::secrets::WorkflowContext;
use serde_json::{Value, json};

/// Build the schema document
pub fn generate_schema() -> Value {
  let contexts: Vec<&str> = WorkflowContext::ALL.iter().map(WorkflowContext::as_str).collect();

  let string_list = json!({ "type": "array", "items": { "type": "string" } });

  let lang_build = json!({
    "type": "object",
    "description": "Configuration for building the driver.",
    "additionalProperties": false,
    "properties": {
      "additional_make_args": {
        "description": "Additional arguments passed to the build entry point.",
        "allOf": [string_list.clone()]
      },
      "additional-make-args": { "$ref": "#/definitions/LangBuildConfig/properties/additional_make_args" },
      "lang_tools": {
        "description": "Install toolchains for these languages for use in the build.",
        "allOf": [string_list.clone()]
      },
      "lang-tools": { "$ref": "#/definitions/LangBuildConfig/properties/lang_tools" }
    }
  });

  let lang_config = json!({
    "type": "object",
    "additionalProperties": false,
    "properties": {
      "build": { "$ref": "#/definitions/LangBuildConfig" },
      "skip_validate": {
        "type": "boolean",
        "default": false,
        "description": "Skip the validation suite in CI. Only meant for use while bringing up a driver."
      },
      "skip-validate": { "$ref": "#/definitions/LangConfig/properties/skip_validate" }
    }
  });

  let secret_config = json!({
    "type": "object",
    "additionalProperties": false,
    "required": ["secret"],
    "properties": {
      "secret": {
        "type": "string",
        "description": "Name of the GitHub secret backing this variable."
      },
      "contexts": {
        "type": "array",
        "description": "Workflow contexts where the secret is available. Defaults to all of them.",
        "items": { "type": "string", "enum": contexts }
      }
    }
  });

  json!({
    "$schema": "http://json-schema.org/draft-07/schema#",
    "title": "GenerateConfig",
    "description": "Configuration for generated driver workflows (.github/workflows/generate.toml).",
    "type": "object",
    "additionalProperties": false,
    "definitions": {
      "LangBuildConfig": lang_build,
      "LangConfig": lang_config,
      "SecretConfig": secret_config
    },
    "properties": {
      "driver": {
        "type": "string",
        "default": "(unknown)",
        "description": "Driver name, lowercase (for example postgresql or sqlite)."
      },
      "environment": {
        "type": ["string", "null"],
        "minLength": 1,
        "description": "GitHub Actions environment used when secrets are included in workflows."
      },
      "private": {
        "type": "boolean",
        "default": false,
        "description": "Whether the driver is private."
      },
      "lang": {
        "type": "object",
        "description": "Languages to generate workflows for (go, rust). `true` enables the defaults, `false` disables.",
        "additionalProperties": {
          "anyOf": [{ "type": "boolean" }, { "$ref": "#/definitions/LangConfig" }]
        }
      },
      "secrets": {
        "type": "object",
        "description": "Environment variables mapped to GitHub secrets. A plain string exposes the secret in every context.",
        "additionalProperties": {
          "anyOf": [{ "type": "string" }, { "$ref": "#/definitions/SecretConfig" }]
        }
      },
      "aws": {
        "type": ["object", "null"],
        "description": "Enable AWS authentication. Adds AWS_ROLE and AWS_ROLE_SESSION_NAME and requests an id-token.",
        "additionalProperties": false,
        "required": ["region"],
        "properties": {
          "region": {
            "type": "string",
            "description": "AWS region used for authentication (for example us-west-2)."
          }
        }
      },
      "gcloud": {
        "type": "boolean",
        "default": false,
        "description": "Enable Google Cloud authentication. Adds GCLOUD_SERVICE_ACCOUNT and GCLOUD_WORKLOAD_IDENTITY_PROVIDER and requests an id-token."
      },
      "validation": {
        "type": "object",
        "description": "Validation workflow settings.",
        "additionalProperties": false,
        "properties": {
          "extra_dependencies": {
            "type": "object",
            "description": "Extra packages for the validation environment, as name = version spec pairs."
          },
          "extra-dependencies": { "$ref": "#/properties/validation/properties/extra_dependencies" }
        }
      }
    }
  })
}
