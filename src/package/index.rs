//! The `manifest.yaml` index listing every package produced in one run

use super::Package;
use super::manifest;
use crate::core::error::{DevResult, ManifestError};
use serde::Serialize;
use toml_edit::DocumentMut;

pub const INDEX_FILE: &str = "manifest.yaml";
const PROJECT_URL: &str = "https://adbc-drivers.org";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageIndex {
  pub drivers: Vec<DriverEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriverEntry {
  pub name: String,
  /// Not part of the installed manifest; falls back to `name`
  pub description: String,
  pub license: String,
  pub path: String,
  pub urls: Vec<String>,
  pub pkginfo: Vec<PkgInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PkgInfo {
  pub version: String,
  pub packages: Vec<PackageRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageRef {
  pub platform: String,
  pub url: String,
}

impl PackageIndex {
  /// Index a single driver; `path` is the short name used in archive paths
  pub fn build(template: &DocumentMut, path: &str, packages: &[Package]) -> Result<Self, ManifestError> {
    let required = |field: &str| {
      manifest::string_field(template, field)
        .map(str::to_string)
        .ok_or_else(|| ManifestError::MissingField { field: field.to_string() })
    };
    let name = required("name")?;
    let license = required("license")?;
    let description = manifest::string_field(template, "description")
      .map(str::to_string)
      .unwrap_or_else(|| name.clone());

    let mut pkginfo: Vec<PkgInfo> = Vec::new();
    for package in packages {
      let entry = PackageRef {
        platform: package.target(),
        url: format!("{}/{}/{}", path, package.version, package.filename()),
      };
      match pkginfo.iter_mut().find(|info| info.version == package.version) {
        Some(info) => info.packages.push(entry),
        None => pkginfo.push(PkgInfo {
          version: package.version.clone(),
          packages: vec![entry],
        }),
      }
    }

    Ok(Self {
      drivers: vec![DriverEntry {
        name,
        description,
        license,
        path: path.to_string(),
        urls: vec![PROJECT_URL.to_string()],
        pkginfo,
      }],
    })
  }

  pub fn to_yaml(&self) -> DevResult<String> {
    Ok(serde_yaml::to_string(self)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::package::{Architecture, Platform};
  use indexmap::IndexMap;

  fn package(platform: Platform, architecture: Architecture, version: &str) -> Package {
    Package {
      name: "pg".to_string(),
      platform,
      architecture,
      version: version.to_string(),
      files: IndexMap::new(),
    }
  }

  #[test]
  fn test_index_groups_by_version() {
    let template: DocumentMut = "name = \"PostgreSQL\"\nlicense = \"Apache-2.0\"\n".parse().unwrap();
    let packages = [
      package(Platform::Linux, Architecture::Amd64, "v1.0.0"),
      package(Platform::Macos, Architecture::Arm64, "v1.0.0"),
    ];
    let index = PackageIndex::build(&template, "pg", &packages).unwrap();
    let driver = &index.drivers[0];
    assert_eq!(driver.description, "PostgreSQL");
    assert_eq!(driver.urls, ["https://adbc-drivers.org"]);
    assert_eq!(driver.pkginfo.len(), 1);
    assert_eq!(driver.pkginfo[0].packages[1].platform, "macos_arm64");
    assert_eq!(
      driver.pkginfo[0].packages[0].url,
      "pg/v1.0.0/pg_linux_amd64_v1.0.0.tar.gz"
    );
  }

  #[test]
  fn test_index_yaml_shape() {
    let template: DocumentMut = "name = \"PG\"\ndescription = \"Postgres driver\"\nlicense = \"MIT\"\n"
      .parse()
      .unwrap();
    let packages = [package(Platform::Windows, Architecture::Amd64, "v0.2.0")];
    let yaml = PackageIndex::build(&template, "pg", &packages).unwrap().to_yaml().unwrap();

    let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
    let driver = &parsed["drivers"][0];
    assert_eq!(driver["description"].as_str(), Some("Postgres driver"));
    assert_eq!(driver["path"].as_str(), Some("pg"));
    assert_eq!(driver["pkginfo"][0]["version"].as_str(), Some("v0.2.0"));
    assert_eq!(
      driver["pkginfo"][0]["packages"][0]["platform"].as_str(),
      Some("windows_amd64")
    );
  }

  #[test]
  fn test_index_requires_license() {
    let template: DocumentMut = "name = \"PG\"\n".parse().unwrap();
    assert_eq!(
      PackageIndex::build(&template, "pg", &[]).unwrap_err(),
      ManifestError::MissingField {
        field: "license".to_string()
      }
    );
  }
}
