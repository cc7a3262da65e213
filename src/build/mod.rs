//! Building driver shared libraries and checking their portability
//!
//! Go drivers are built with `go build -buildmode=c-shared`, Rust drivers with
//! `cargo build`. In CI on Linux both go through a manylinux container so the
//! result runs on old distributions. Output lands in `<repo>/build/`.

pub mod symbols;

use crate::core::error::{DevError, DevResult, ResultExt};
use crate::core::process::ToolCommand;
use crate::package::{Architecture, Platform};
use crate::release::version;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const VERSION_PROPERTY: &str = "github.com/adbc-drivers/driverbase-go/driverbase.infoDriverVersion";
const MACOS_MIN_FLAG: &str = "-mmacosx-version-min=11.0";
const MACOS_DEPLOYMENT_TARGET: &str = "11.0";
const EXPORT_SCRIPT_FLAGS: &str = "-linkmode external -extldflags=-Wl,--version-script=/only-export-adbc.ld";

/// Driver implementation language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
  Go,
  Rust,
}

impl Lang {
  pub fn parse(value: &str) -> DevResult<Self> {
    match value.trim().to_lowercase().as_str() {
      "go" => Ok(Self::Go),
      "rust" => Ok(Self::Rust),
      other => Err(DevError::with_help(
        format!("Unsupported language: {}", other),
        "Use --lang go or --lang rust",
      )),
    }
  }
}

impl fmt::Display for Lang {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Lang::Go => f.write_str("go"),
      Lang::Rust => f.write_str("rust"),
    }
  }
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
  pub driver: String,
  pub lang: Lang,
  /// Build inside the manylinux container (Linux only)
  pub ci: bool,
  pub debug: bool,
  /// Extra Go build tags
  pub build_tags: Vec<String>,
  /// Extra Cargo features
  pub features: Vec<String>,
  /// Extra docker volumes for the Rust container
  pub volumes: Vec<String>,
}

/// Where a build runs and what it produces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
  pub repo_root: PathBuf,
  pub driver_root: PathBuf,
  pub platform: Platform,
  /// `libadbc_driver_<driver>.<ext>`
  pub target: String,
}

impl BuildLayout {
  /// `./<driver>` when it is a directory, otherwise the repository itself
  pub fn resolve(repo_root: &Path, driver: &str, platform: Platform) -> DevResult<Self> {
    let candidate = repo_root.join(driver);
    let driver_root = if candidate.is_dir() {
      candidate
    } else if version::MANIFEST_MARKERS.iter().any(|m| repo_root.join(m).is_file()) {
      repo_root.to_path_buf()
    } else {
      return Err(DevError::with_help(
        format!("Cannot find driver {} under {}", driver, repo_root.display()),
        format!("Expected ./{} or a go.mod/Cargo.toml in the current directory", driver),
      ));
    };
    Ok(Self {
      repo_root: repo_root.to_path_buf(),
      driver_root,
      platform,
      target: target_name(driver, platform),
    })
  }

  pub fn output(&self) -> PathBuf {
    self.repo_root.join("build").join(&self.target)
  }

  /// Driver root relative to the repository, as seen inside the container
  fn container_dir(&self) -> String {
    let relative = self.driver_root.strip_prefix(&self.repo_root).unwrap_or(Path::new(""));
    let relative = crate::utils::path_to_git_format(relative);
    if relative.is_empty() {
      "/source".to_string()
    } else {
      format!("/source/{}", relative)
    }
  }
}

/// `libadbc_driver_<driver>.<ext>` for `platform`
pub fn target_name(driver: &str, platform: Platform) -> String {
  format!("libadbc_driver_{}.{}", driver, platform.library_extension())
}

fn go_tags(options: &BuildOptions) -> String {
  let mut tags = vec!["driverlib".to_string()];
  if options.debug {
    tags.push("assert".to_string());
  }
  tags.extend(options.build_tags.iter().cloned());
  format!("-tags={}", tags.join(","))
}

fn go_ldflags(version: &str) -> String {
  format!("-s -w -X {}={}", VERSION_PROPERTY, version)
}

/// `go build` run directly in the driver root
pub fn go_build_command(layout: &BuildLayout, options: &BuildOptions, version: &str) -> DevResult<ToolCommand> {
  let mut cmd = ToolCommand::new("go")
    .args(["build", "-buildmode=c-shared"])
    .arg(go_tags(options))
    .arg("-o")
    .arg(layout.output().to_string_lossy())
    .arg("-ldflags")
    .arg(go_ldflags(version))
    .arg("./pkg")
    .current_dir(&layout.driver_root);
  if layout.platform == Platform::Macos {
    cmd = cmd
      .env_override("CGO_CFLAGS", MACOS_MIN_FLAG)?
      .env_override("CGO_LDFLAGS", MACOS_MIN_FLAG)?;
  }
  Ok(cmd)
}

/// Environment variables forwarded into the container as `K='v' ` pairs
fn smuggled_env(vars: &[&str]) -> String {
  vars
    .iter()
    .filter_map(|var| std::env::var(var).ok().map(|value| format!("{}={} ", var, shell_quote(&value))))
    .collect()
}

fn shell_quote(value: &str) -> String {
  format!("'{}'", value.replace('\'', r"'\''"))
}

fn compose_command(
  layout: &BuildLayout,
  uid: &str,
  volumes: &[String],
  service: &str,
  script: String,
) -> DevResult<ToolCommand> {
  let mut cmd = ToolCommand::new("docker").args(["compose", "run", "--rm", "--user", uid]);
  for volume in volumes {
    cmd = cmd.arg("-v").arg(volume.as_str());
  }
  cmd
    .args([service, "--", "bash", "-c"])
    .arg(script)
    .current_dir(&layout.repo_root)
    .env_override("SOURCE_ROOT", &layout.repo_root.to_string_lossy())?
    .env_override("ARCH", Architecture::current()?.as_str())
}

/// `go build` inside the manylinux container, exporting only ADBC symbols
pub fn go_container_command(
  layout: &BuildLayout,
  options: &BuildOptions,
  version: &str,
  uid: &str,
) -> DevResult<ToolCommand> {
  let script = format!(
    "cd {} && env {}go build -buildmode=c-shared {} -o /source/build/{} -ldflags \"{} {}\" ./pkg",
    layout.container_dir(),
    smuggled_env(&["CGO_CFLAGS", "CGO_LDFLAGS"]),
    go_tags(options),
    layout.target,
    go_ldflags(version),
    EXPORT_SCRIPT_FLAGS,
  );
  compose_command(layout, uid, &[], "manylinux", script)
}

fn cargo_args(options: &BuildOptions) -> Vec<String> {
  let mut args = Vec::new();
  if !options.debug {
    args.push("--release".to_string());
  }
  if !options.features.is_empty() {
    args.push("--features".to_string());
    args.push(options.features.join(","));
  }
  args
}

pub fn cargo_build_command(layout: &BuildLayout, options: &BuildOptions) -> DevResult<ToolCommand> {
  let mut cmd = ToolCommand::new("cargo")
    .arg("build")
    .args(cargo_args(options))
    .current_dir(&layout.driver_root);
  if layout.platform == Platform::Macos {
    cmd = cmd.env_override("MACOSX_DEPLOYMENT_TARGET", MACOS_DEPLOYMENT_TARGET)?;
  }
  Ok(cmd)
}

pub fn cargo_container_command(layout: &BuildLayout, options: &BuildOptions, uid: &str) -> DevResult<ToolCommand> {
  let script = format!(
    "cd {} && env {}cargo build {}",
    layout.container_dir(),
    smuggled_env(&["PROTOC"]),
    cargo_args(options).join(" "),
  );
  compose_command(layout, uid, &options.volumes, "manylinux-rust", script)
}

/// Where cargo leaves the library before it is moved into `build/`
pub fn cargo_artifact(layout: &BuildLayout, debug: bool) -> PathBuf {
  let profile = if debug { "debug" } else { "release" };
  let name = match layout.platform {
    Platform::Windows => layout.target.strip_prefix("lib").unwrap_or(&layout.target),
    _ => layout.target.as_str(),
  };
  layout.driver_root.join("target").join(profile).join(name)
}

fn current_uid() -> DevResult<String> {
  Ok(ToolCommand::new("id").arg("-u").output()?.trim().to_string())
}

/// Build the driver, returning the path of the library in `build/`
pub fn build(repo_root: &Path, options: &BuildOptions) -> DevResult<PathBuf> {
  let platform = Platform::current().ok_or_else(|| DevError::message("Unsupported platform"))?;
  let layout = BuildLayout::resolve(repo_root, &options.driver, platform)?;
  let version = version::resolve(&layout.driver_root, false)?;
  let build_dir = layout.repo_root.join("build");
  fs::create_dir_all(&build_dir).with_context(|| format!("Failed to create {}", build_dir.display()))?;

  println!("Building {} version {}", layout.target, version);
  let in_container = options.ci && platform == Platform::Linux;

  match options.lang {
    Lang::Go => {
      if in_container {
        ToolCommand::new("go")
          .args(["mod", "vendor"])
          .current_dir(&layout.driver_root)
          .run()?;
        go_container_command(&layout, options, &version, &current_uid()?)?.run()?;
      } else {
        go_build_command(&layout, options, &version)?.run()?;
      }
      let header = layout.output().with_extension("h");
      if header.exists() {
        fs::remove_file(&header).with_context(|| format!("Failed to remove {}", header.display()))?;
      }
    }
    Lang::Rust => {
      info!("Cargo features: {:?}", options.features);
      if in_container {
        cargo_container_command(&layout, options, &current_uid()?)?.run()?;
      } else {
        cargo_build_command(&layout, options)?.run()?;
      }
      let artifact = cargo_artifact(&layout, options.debug);
      fs::rename(&artifact, layout.output())
        .with_context(|| format!("Failed to move {} into build/", artifact.display()))?;
    }
  }

  let output = layout.output();
  make_executable(&output)?;
  Ok(output)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> DevResult<()> {
  use std::os::unix::fs::PermissionsExt;
  fs::set_permissions(path, fs::Permissions::from_mode(0o755))
    .with_context(|| format!("Failed to chmod {}", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> DevResult<()> {
  Ok(())
}

/// Run the platform's portability checks against `build/<target>`
pub fn check(repo_root: &Path, driver: &str) -> DevResult<PathBuf> {
  let Some(platform) = Platform::current() else {
    return Err(DevError::message("Unsupported platform"));
  };
  let binary = repo_root.join("build").join(target_name(driver, platform));
  if !binary.is_file() {
    return Err(DevError::with_help(
      format!("{} does not exist", binary.display()),
      format!("Run `adbc-drivers-dev build --driver {}` first", driver),
    ));
  }

  let binary_arg = binary.to_string_lossy().to_string();
  match platform {
    Platform::Linux => {
      let nm = ToolCommand::new("nm").args(["--demangle", "--dynamic"]).arg(binary_arg.as_str()).output()?;
      symbols::check_linux_symbols(&binary, &nm)?;
    }
    Platform::Macos => {
      let otool = ToolCommand::new("otool").arg("-l").arg(binary_arg.as_str()).output()?;
      symbols::check_macos_load_commands(&binary, &otool)?;
    }
    Platform::Windows => info!("No binary checks on Windows"),
  }
  Ok(binary)
}
