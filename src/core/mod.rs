//! Shared building blocks for every adbc-drivers-dev command
//!
//! - **config**: generate.toml parsing, validation and template projection
//! - **error**: error types with contextual help messages and exit codes
//! - **process**: external tool invocation with an environment whitelist
//! - **schema**: JSON Schema for generate.toml
//! - **secrets**: secret scoping across workflow contexts
//! - **telemetry**: tracing subscriber setup
//! - **vcs**: git operations behind a narrow trait (SystemGit)

pub mod config;
pub mod error;
pub mod process;
pub mod schema;
pub mod secrets;
pub mod telemetry;
pub mod vcs;
