//! Driver packages: one tarball per (platform, architecture) build
//!
//! - **naming**: binary and input-directory naming conventions, driver discovery
//! - **manifest**: manifest validation and stamping
//! - **license**: LICENSE / NOTICE contents bundled with every package
//! - **archive**: reproducible `.tar.gz` writer
//! - **index**: the `manifest.yaml` index of everything produced

pub mod archive;
pub mod index;
pub mod license;
pub mod manifest;
pub mod naming;

use crate::core::error::{DevResult, NamingError, ResultExt};
use crate::release::version;
use indexmap::IndexMap;
use naming::DiscoveredDriver;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use toml_edit::DocumentMut;

/// Target operating system of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
  Linux,
  Macos,
  Windows,
}

impl Platform {
  /// Parse a directory component; an OS version suffix (`macos_11_0`) is dropped
  pub fn parse(value: &str) -> Result<Self, NamingError> {
    let base = value.split('_').next().unwrap_or_default();
    match base.to_lowercase().as_str() {
      "linux" => Ok(Self::Linux),
      "macos" => Ok(Self::Macos),
      "windows" => Ok(Self::Windows),
      _ => Err(NamingError::Platform {
        value: value.to_string(),
      }),
    }
  }

  /// Platform of the running binary
  pub fn current() -> Option<Self> {
    match std::env::consts::OS {
      "linux" => Some(Self::Linux),
      "macos" => Some(Self::Macos),
      "windows" => Some(Self::Windows),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Linux => "linux",
      Self::Macos => "macos",
      Self::Windows => "windows",
    }
  }

  /// Shared library extension
  pub fn library_extension(&self) -> &'static str {
    match self {
      Self::Linux => "so",
      Self::Macos => "dylib",
      Self::Windows => "dll",
    }
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// CPU architecture of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
  /// Also known as x86_64, x64
  Amd64,
  /// Also known as aarch64, arm64v8
  Arm64,
}

impl Architecture {
  /// Accepts the canonical names and the common aliases
  pub fn parse(value: &str) -> Result<Self, NamingError> {
    match value.to_lowercase().as_str() {
      "amd64" | "x86_64" | "x64" => Ok(Self::Amd64),
      "arm64" | "aarch64" | "arm64v8" => Ok(Self::Arm64),
      _ => Err(NamingError::Architecture {
        value: value.to_string(),
      }),
    }
  }

  /// Architecture of the running binary
  pub fn current() -> Result<Self, NamingError> {
    Self::parse(std::env::consts::ARCH)
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Amd64 => "amd64",
      Self::Arm64 => "arm64",
    }
  }
}

impl fmt::Display for Architecture {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Contents of one archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
  pub name: String,
  pub platform: Platform,
  pub architecture: Architecture,
  pub version: String,
  /// Archive entries in write order
  pub files: IndexMap<String, Vec<u8>>,
}

impl Package {
  /// `<name>_<platform>_<arch>_<version>.tar.gz`
  pub fn filename(&self) -> String {
    format!(
      "{}_{}_{}_{}.tar.gz",
      self.name, self.platform, self.architecture, self.version
    )
  }

  /// `<name>/<version>/<filename>`, relative to the output directory
  pub fn relative_path(&self) -> PathBuf {
    Path::new(&self.name).join(&self.version).join(self.filename())
  }

  /// `<platform>_<arch>`
  pub fn target(&self) -> String {
    format!("{}_{}", self.platform, self.architecture)
  }
}

/// Stamps a manifest template into one package per discovered binary
pub struct PackageAssembler {
  template: DocumentMut,
  driver_name: String,
}

impl PackageAssembler {
  pub fn new(template: DocumentMut, driver_name: impl Into<String>) -> Self {
    Self {
      template,
      driver_name: driver_name.into(),
    }
  }

  pub fn template(&self) -> &DocumentMut {
    &self.template
  }

  /// Build packages for `drivers`, all at `version`
  pub fn assemble(&self, version: &str, drivers: &[DiscoveredDriver]) -> DevResult<Vec<Package>> {
    let mut packages = Vec::with_capacity(drivers.len());
    for driver in drivers {
      let filename = driver
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
      let binary = fs::read(&driver.path).with_context(|| format!("Failed to read {}", driver.path.display()))?;

      let stamped = manifest::stamp(&self.template, version, &filename);
      manifest::validate_manifest(&stamped)?;

      let mut files = IndexMap::new();
      files.insert(filename, binary);
      files.insert("MANIFEST".to_string(), stamped.to_string().into_bytes());

      packages.push(Package {
        name: self.driver_name.clone(),
        platform: driver.platform,
        architecture: driver.architecture,
        version: version.to_string(),
        files,
      });
    }
    Ok(packages)
  }
}

/// Resolve the driver version, then assemble its packages
pub fn generate_packages(
  assembler: &PackageAssembler,
  driver_root: &Path,
  drivers: &[DiscoveredDriver],
  strict: bool,
) -> DevResult<Vec<Package>> {
  let version = version::resolve(driver_root, strict)?;
  assembler.assemble(&version, drivers)
}
