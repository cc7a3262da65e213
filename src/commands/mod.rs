//! CLI commands for adbc-drivers-dev
//!
//! Each runner takes parsed arguments, calls into the feature modules and
//! prints user-facing results to stdout.
//!
//! ## Workflows
//! - **generate**: render CI workflows from `generate.toml`
//! - **schema**: print the JSON Schema for `generate.toml`
//! - **update-actions**: pin template actions to their latest release
//!
//! ## Releases
//! - **version**: derive a driver version from git tags
//! - **changelog**: print the changelog for a commit range
//! - **release**: draft a GitHub release for a tag
//! - **package**: bundle built drivers into archives plus an index
//!
//! ## Builds
//! - **build**: build a driver shared library
//! - **check**: check a built library's symbols and platform minimums
//!
//! ## Repository checks
//! - **copyright**: current-year copyright headers
//! - **licenses**: Apache RAT audit plus ADBC header rules
//!
//! ## Validation
//! - **validation**: scaffold, run and document the driver validation suite

pub mod audit;
pub mod build;
pub mod generate;
pub mod package;
pub mod release;
pub mod validation;
pub mod version;

pub use audit::{run_copyright, run_licenses};
pub use build::{run_build, run_check};
pub use generate::{run_generate, run_schema, run_update_actions};
pub use package::{PackageArgs, run_package};
pub use release::{run_changelog, run_release};
pub use validation::{run_validation_docs, run_validation_init, run_validation_run};
pub use version::run_version;
