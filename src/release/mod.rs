//! Versions, changelogs and GitHub releases for drivers
//!
//! - **version**: version strings derived from `<subdir>/vX.Y.Z` tags
//! - **changelog**: conventional-commit release notes scoped to a subdirectory
//! - **publish**: tag parsing, previous-release lookup and `gh release create`

pub mod changelog;
pub mod publish;
pub mod version;
