//! CI workflow generation from generate.toml
//!
//! - **render**: embedded Tera templates
//! - **generate**: which files are produced for a config, and writing them
//! - **actions**: pinning third-party actions in the templates to commit SHAs

pub mod actions;
pub mod generate;
pub mod render;
