//! Error types for adbc-drivers-dev with contextual messages and exit codes
//!
//! Every failure the tool can report is one of the categories below. Each carries
//! enough context to print a useful message, an optional help line, and maps onto
//! a process exit code. External tools that fail propagate their own exit code.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for adbc-drivers-dev
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, manifest, invalid args, missing files)
  User,
  /// System error (git, network, I/O)
  System,
  /// Validation failure (strict versioning, header or symbol checks)
  Validation,
  /// A findings count reported by a check (copyright/license scans)
  Findings(u32),
  /// Exit code of a failed external tool
  Tool(i32),
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    match self {
      ExitCode::User => 1,
      ExitCode::System => 2,
      ExitCode::Validation => 3,
      ExitCode::Findings(count) => count.clamp(1, 255) as i32,
      ExitCode::Tool(code) if code != 0 => code,
      ExitCode::Tool(_) => 1,
    }
  }
}

/// Main error type for adbc-drivers-dev
#[derive(Debug)]
pub enum DevError {
  /// generate.toml did not match the schema
  Schema(SchemaError),

  /// Version could not be derived (or strict mode rejected it)
  Version(VersionError),

  /// Package manifest is incomplete
  Manifest(ManifestError),

  /// A file or directory name does not follow the naming convention
  Naming(NamingError),

  /// An external process failed
  Tool(ToolError),

  /// Git operation errors
  Git(GitError),

  /// A check found problems
  Validation(ValidationError),

  /// Template rendering failed
  Template(String),

  /// I/O errors
  Io { source: io::Error, context: Option<String> },

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl DevError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    DevError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    DevError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      DevError::Message { message, context, help } => DevError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      DevError::Io { source, context } => DevError::Io {
        source,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      DevError::Schema(_) => ExitCode::User,
      DevError::Version(e) => e.exit_code(),
      DevError::Manifest(_) => ExitCode::User,
      DevError::Naming(_) => ExitCode::User,
      DevError::Tool(e) => ExitCode::Tool(e.code.unwrap_or(1)),
      DevError::Git(_) => ExitCode::System,
      DevError::Validation(ValidationError::Findings { count, .. }) => ExitCode::Findings(*count),
      DevError::Validation(_) => ExitCode::Validation,
      DevError::Template(_) => ExitCode::User,
      DevError::Io { .. } => ExitCode::System,
      DevError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      DevError::Schema(e) => e.help_message(),
      DevError::Version(e) => e.help_message(),
      DevError::Git(e) => e.help_message(),
      DevError::Tool(e) => e.help_message(),
      DevError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for DevError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DevError::Schema(e) => write!(f, "{}", e),
      DevError::Version(e) => write!(f, "{}", e),
      DevError::Manifest(e) => write!(f, "{}", e),
      DevError::Naming(e) => write!(f, "{}", e),
      DevError::Tool(e) => write!(f, "{}", e),
      DevError::Git(e) => write!(f, "{}", e),
      DevError::Validation(e) => write!(f, "{}", e),
      DevError::Template(msg) => write!(f, "Template error: {}", msg),
      DevError::Io { source, context } => {
        write!(f, "I/O error: {}", source)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
      DevError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for DevError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      DevError::Io { source, .. } => Some(source),
      _ => None,
    }
  }
}

impl From<io::Error> for DevError {
  fn from(err: io::Error) -> Self {
    DevError::Io {
      source: err,
      context: None,
    }
  }
}

impl From<String> for DevError {
  fn from(msg: String) -> Self {
    DevError::message(msg)
  }
}

impl From<&str> for DevError {
  fn from(msg: &str) -> Self {
    DevError::message(msg)
  }
}

impl From<SchemaError> for DevError {
  fn from(err: SchemaError) -> Self {
    DevError::Schema(err)
  }
}

impl From<VersionError> for DevError {
  fn from(err: VersionError) -> Self {
    DevError::Version(err)
  }
}

impl From<ManifestError> for DevError {
  fn from(err: ManifestError) -> Self {
    DevError::Manifest(err)
  }
}

impl From<NamingError> for DevError {
  fn from(err: NamingError) -> Self {
    DevError::Naming(err)
  }
}

impl From<ToolError> for DevError {
  fn from(err: ToolError) -> Self {
    DevError::Tool(err)
  }
}

impl From<GitError> for DevError {
  fn from(err: GitError) -> Self {
    DevError::Git(err)
  }
}

impl From<ValidationError> for DevError {
  fn from(err: ValidationError) -> Self {
    DevError::Validation(err)
  }
}

impl From<toml_edit::TomlError> for DevError {
  fn from(err: toml_edit::TomlError) -> Self {
    DevError::message(format!("TOML parse error: {}", err))
  }
}

impl From<toml_edit::de::Error> for DevError {
  fn from(err: toml_edit::de::Error) -> Self {
    DevError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for DevError {
  fn from(err: toml_edit::ser::Error) -> Self {
    DevError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<serde_json::Error> for DevError {
  fn from(err: serde_json::Error) -> Self {
    DevError::message(format!("JSON error: {}", err))
  }
}

impl From<serde_yaml::Error> for DevError {
  fn from(err: serde_yaml::Error) -> Self {
    DevError::message(format!("YAML error: {}", err))
  }
}

impl From<tera::Error> for DevError {
  fn from(err: tera::Error) -> Self {
    // tera nests the interesting part (missing variable, bad filter) in the source chain
    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(inner) = source {
      message.push_str(": ");
      message.push_str(&inner.to_string());
      source = inner.source();
    }
    DevError::Template(message)
  }
}

impl From<reqwest::Error> for DevError {
  fn from(err: reqwest::Error) -> Self {
    DevError::message(format!("HTTP error: {}", err))
  }
}

impl From<regex::Error> for DevError {
  fn from(err: regex::Error) -> Self {
    DevError::message(format!("Regex error: {}", err))
  }
}

impl From<glob::PatternError> for DevError {
  fn from(err: glob::PatternError) -> Self {
    DevError::message(format!("Invalid glob pattern: {}", err))
  }
}

impl From<roxmltree::Error> for DevError {
  fn from(err: roxmltree::Error) -> Self {
    DevError::message(format!("XML parse error: {}", err))
  }
}

impl From<std::num::ParseIntError> for DevError {
  fn from(err: std::num::ParseIntError) -> Self {
    DevError::message(format!("Parse error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for DevError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    DevError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<std::path::StripPrefixError> for DevError {
  fn from(err: std::path::StripPrefixError) -> Self {
    DevError::message(format!("Path strip prefix error: {}", err))
  }
}

/// Configuration schema errors (generate.toml)
///
/// `path` is the dotted location of the offending table, empty for the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
  /// Keys not in the schema
  UnknownKeys { path: String, keys: Vec<String> },

  /// Value has the wrong type
  InvalidType {
    path: String,
    expected: &'static str,
    found: String,
  },

  /// Value has the right type but is not acceptable
  InvalidValue { path: String, message: String },

  /// A required key is absent
  MissingKey { path: String, key: String },

  /// A secret names a workflow context that does not exist
  UnknownContext { path: String, context: String },
}

impl SchemaError {
  fn help_message(&self) -> Option<String> {
    match self {
      SchemaError::UnknownKeys { .. } => Some(
        "Run `adbc-drivers-dev schema` to print the JSON schema for generate.toml.".to_string(),
      ),
      SchemaError::UnknownContext { .. } => {
        Some("Valid contexts are: build:test, build:release, test, validate.".to_string())
      }
      _ => None,
    }
  }
}

fn display_path(path: &str) -> &str {
  if path.is_empty() { "(root)" } else { path }
}

impl fmt::Display for SchemaError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SchemaError::UnknownKeys { path, keys } => {
        let keys: Vec<String> = keys.iter().map(|k| format!("`{}`", k)).collect();
        write!(f, "Unknown key(s) in {}: {}", display_path(path), keys.join(", "))
      }
      SchemaError::InvalidType { path, expected, found } => {
        write!(f, "`{}` must be {} (found {})", display_path(path), expected, found)
      }
      SchemaError::InvalidValue { path, message } => {
        write!(f, "`{}` {}", display_path(path), message)
      }
      SchemaError::MissingKey { path, key } => {
        write!(f, "Missing required key `{}` in {}", key, display_path(path))
      }
      SchemaError::UnknownContext { path, context } => {
        write!(f, "Unknown workflow context '{}' in {}", context, display_path(path))
      }
    }
  }
}

/// Version derivation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
  /// Driver root holds neither Cargo.toml nor go.mod
  NoManifest { driver_root: PathBuf },

  /// No git repository above the driver root
  NotInRepository { driver_root: PathBuf },

  /// Strict mode: no tag matches the driver prefix
  NoTagsFound { driver_root: PathBuf, prefix: String },

  /// Strict mode: HEAD is ahead of the newest tag
  NotOnTag { driver_root: PathBuf, tag: String, count: u64 },

  /// Strict mode: tracked files are modified
  DirtyTree { repo: PathBuf, entries: Vec<String> },
}

impl VersionError {
  fn exit_code(&self) -> ExitCode {
    match self {
      VersionError::NoManifest { .. } | VersionError::NotInRepository { .. } => ExitCode::User,
      _ => ExitCode::Validation,
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      VersionError::NoTagsFound { prefix, .. } => Some(format!("Create a release tag first, e.g. `git tag {}0.1.0`.", prefix)),
      VersionError::NotOnTag { .. } => Some("Release builds must be made from a tagged commit.".to_string()),
      VersionError::DirtyTree { .. } => Some("Commit or stash your changes before releasing.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for VersionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionError::NoManifest { driver_root } => {
        write!(f, "{} does not contain a Cargo.toml or go.mod", driver_root.display())
      }
      VersionError::NotInRepository { driver_root } => {
        write!(f, "{} is not in a git repository", driver_root.display())
      }
      VersionError::NoTagsFound { driver_root, prefix } => {
        write!(f, "No tags matching '{}*' found for driver {}", prefix, driver_root.display())
      }
      VersionError::NotOnTag { driver_root, tag, count } => {
        write!(
          f,
          "Driver {} is not on tag {}, but has {} commits since",
          driver_root.display(),
          tag,
          count
        )
      }
      VersionError::DirtyTree { repo, entries } => {
        write!(f, "{} has uncommitted changes", repo.display())?;
        for entry in entries {
          write!(f, "\n> {}", entry)?;
        }
        Ok(())
      }
    }
  }
}

/// Package manifest errors, reported in field declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
  /// Required field is absent
  MissingField { field: String },

  /// Field is present but not a string
  NotAString { field: String },

  /// Field is an empty string
  Empty { field: String },

  /// The `[Files]` table is absent
  MissingFilesTable,
}

impl fmt::Display for ManifestError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ManifestError::MissingField { field } => write!(f, "Manifest missing required `{}`", field),
      ManifestError::NotAString { field } => write!(f, "Manifest `{}` must be a string", field),
      ManifestError::Empty { field } => write!(f, "Manifest `{}` must not be empty", field),
      ManifestError::MissingFilesTable => write!(f, "Manifest missing required `Files` section"),
    }
  }
}

/// Naming convention violations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
  /// Binary name is not `[lib]adbc_driver_<name>.<ext>`
  DriverFile { name: String },

  /// Input directory is not `drivers-<platform>-<architecture>`
  InputDirectory { name: String },

  /// Unknown platform component
  Platform { value: String },

  /// Unknown architecture component
  Architecture { value: String },
}

impl fmt::Display for NamingError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      NamingError::DriverFile { name } => write!(f, "Invalid driver name: {}", name),
      NamingError::InputDirectory { name } => write!(
        f,
        "Invalid input directory name: {}\nExpected format: drivers-<platform>-<architecture>",
        name
      ),
      NamingError::Platform { value } => write!(f, "Unsupported platform: {}", value),
      NamingError::Architecture { value } => write!(f, "{} is not a recognized architecture", value),
    }
  }
}

/// External process failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
  /// Rendered command line
  pub command: String,
  /// Exit code, if the process exited normally
  pub code: Option<i32>,
  /// Captured stderr (empty when inherited)
  pub stderr: String,
}

impl ToolError {
  fn help_message(&self) -> Option<String> {
    if self.stderr.contains("not found") || self.stderr.contains("No such file") {
      let program = self.command.split_whitespace().next().unwrap_or_default();
      return Some(format!("Check that `{}` is installed and on PATH.", program));
    }
    None
  }
}

impl fmt::Display for ToolError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.code {
      Some(code) => write!(f, "Command failed with exit code {}: {}", code, self.command)?,
      None => write!(f, "Command terminated by signal: {}", self.command)?,
    }
    let stderr = self.stderr.trim();
    if !stderr.is_empty() {
      write!(f, "\n{}", stderr)?;
    }
    Ok(())
  }
}

/// Git operation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// A ref or commit could not be resolved
  RefNotFound { refname: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Run this command inside a git checkout (looked at {}).",
        path.display()
      )),
      GitError::RefNotFound { .. } => Some("Fetch tags with `git fetch --tags` and check the spelling.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr.trim())
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::RefNotFound { refname } => {
        write!(f, "Could not resolve git ref: {}", refname)
      }
    }
  }
}

/// Failures reported by the check commands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
  /// A scan found `count` problems
  Findings { check: String, count: u32 },

  /// A built binary violates a portability rule
  Binary { binary: PathBuf, reason: String },
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::Findings { check, count } => {
        write!(f, "{} check failed: {} problem(s) found", check, count)
      }
      ValidationError::Binary { binary, reason } => {
        write!(f, "{}: {}", binary.display(), reason)
      }
    }
  }
}

/// Result type alias for adbc-drivers-dev
pub type DevResult<T> = Result<T, DevError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> DevResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> DevResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<DevError>,
{
  fn context(self, ctx: impl Into<String>) -> DevResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> DevResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &DevError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_schema_error_names_keys_and_path() {
    let err = SchemaError::UnknownKeys {
      path: "secrets.fizz".to_string(),
      keys: vec!["foo".to_string(), "bar".to_string()],
    };
    assert_eq!(err.to_string(), "Unknown key(s) in secrets.fizz: `foo`, `bar`");

    let err = SchemaError::UnknownKeys {
      path: String::new(),
      keys: vec!["unknown_key".to_string()],
    };
    assert!(err.to_string().contains("(root)"));
    assert!(err.to_string().contains("`unknown_key`"));
  }

  #[test]
  fn test_exit_codes() {
    assert_eq!(DevError::from(SchemaError::MissingKey { path: "aws".into(), key: "region".into() }).exit_code().as_i32(), 1);
    assert_eq!(DevError::from(io::Error::other("boom")).exit_code().as_i32(), 2);
    let dirty = VersionError::DirtyTree {
      repo: PathBuf::from("/repo"),
      entries: vec![" M go/driver.go".to_string()],
    };
    assert_eq!(DevError::from(dirty).exit_code().as_i32(), 3);

    let tool = ToolError {
      command: "go build".to_string(),
      code: Some(42),
      stderr: String::new(),
    };
    assert_eq!(DevError::from(tool).exit_code().as_i32(), 42);

    let findings = ValidationError::Findings {
      check: "copyright".to_string(),
      count: 1000,
    };
    assert_eq!(DevError::from(findings).exit_code().as_i32(), 255);
  }

  #[test]
  fn test_dirty_tree_lists_entries() {
    let err = VersionError::DirtyTree {
      repo: PathBuf::from("/repo"),
      entries: vec![" M a.go".to_string(), "M  b.go".to_string()],
    };
    let text = err.to_string();
    assert!(text.starts_with("/repo has uncommitted changes"));
    assert!(text.contains("\n>  M a.go"));
    assert!(text.contains("\n> M  b.go"));
  }

  #[test]
  fn test_context_on_io_error_is_kept() {
    let err = DevError::from(io::Error::new(io::ErrorKind::NotFound, "missing")).context("Failed to read manifest.toml");
    let text = err.to_string();
    assert!(text.contains("missing"));
    assert!(text.contains("Failed to read manifest.toml"));
    assert_eq!(err.exit_code(), ExitCode::System);
  }
}
