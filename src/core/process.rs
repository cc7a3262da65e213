//! External tool invocation
//!
//! Builds, packaging and checks shell out to go, cargo, docker, gh, java and
//! friends. [`ToolCommand`] records the command line so failures and verbose
//! echoes can show exactly what ran, and restricts which environment variables
//! a caller may override.

use crate::core::error::{DevError, DevResult, ToolError};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Echo every external command to stderr before it runs
pub fn set_verbose(verbose: bool) {
  VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
  VERBOSE.load(Ordering::Relaxed)
}

/// Variables whose override is appended to the inherited value
const APPEND_VARS: &[&str] = &["CGO_CFLAGS", "CGO_LDFLAGS"];

/// Variables whose override replaces the inherited value
const REPLACE_VARS: &[&str] = &["ADBC_DRIVER_BUILD_VERSION", "ARCH", "MACOSX_DEPLOYMENT_TARGET", "SOURCE_ROOT"];

/// A command line plus working directory and environment overrides
#[derive(Debug, Clone)]
pub struct ToolCommand {
  program: String,
  args: Vec<String>,
  cwd: Option<PathBuf>,
  env: IndexMap<String, String>,
}

impl ToolCommand {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
      env: IndexMap::new(),
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
    self.cwd = Some(dir.as_ref().to_path_buf());
    self
  }

  /// Override an environment variable from the allowed set
  pub fn env_override(mut self, key: &str, value: &str) -> DevResult<Self> {
    let value = if APPEND_VARS.contains(&key) {
      match std::env::var(key) {
        Ok(existing) if !existing.is_empty() => format!("{} {}", existing, value),
        _ => value.to_string(),
      }
    } else if REPLACE_VARS.contains(&key) {
      value.to_string()
    } else {
      return Err(DevError::message(format!(
        "Refusing to override environment variable {} for {}",
        key, self.program
      )));
    };
    self.env.insert(key.to_string(), value);
    Ok(self)
  }

  /// The command line as a single string
  pub fn display(&self) -> String {
    std::iter::once(self.program.as_str())
      .chain(self.args.iter().map(String::as_str))
      .collect::<Vec<_>>()
      .join(" ")
  }

  fn command(&self) -> Command {
    let mut cmd = Command::new(&self.program);
    cmd.args(&self.args);
    if let Some(cwd) = &self.cwd {
      cmd.current_dir(cwd);
    }
    for (key, value) in &self.env {
      cmd.env(key, value);
    }
    cmd
  }

  fn announce(&self) {
    debug!(cwd = ?self.cwd, "{}", self.display());
    if is_verbose() {
      let cwd = self
        .cwd
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ".".to_string());
      eprintln!("* [{}] {}", cwd, self.display());
      for (key, value) in &self.env {
        eprintln!("* [env] {}={}", key, value);
      }
    }
  }

  fn spawn_error(&self, err: std::io::Error) -> DevError {
    DevError::Tool(ToolError {
      command: self.display(),
      code: None,
      stderr: format!("{}: {}", self.program, err),
    })
  }

  /// Run with inherited stdio
  pub fn run(&self) -> DevResult<()> {
    self.announce();
    let status = self.command().status().map_err(|e| self.spawn_error(e))?;
    if !status.success() {
      return Err(DevError::Tool(ToolError {
        command: self.display(),
        code: status.code(),
        stderr: String::new(),
      }));
    }
    Ok(())
  }

  /// Run and capture stdout; stderr is kept for the error
  pub fn output(&self) -> DevResult<String> {
    self.announce();
    let output = self
      .command()
      .stdin(Stdio::null())
      .output()
      .map_err(|e| self.spawn_error(e))?;
    if !output.status.success() {
      return Err(DevError::Tool(ToolError {
        command: self.display(),
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
  }
}
