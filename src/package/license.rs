//! LICENSE and NOTICE contents bundled into every package
//!
//! A `license.tpl` beside the manifest template means a Go driver whose
//! third-party licenses are rendered by `go-licenses`. Otherwise a plain
//! `LICENSE.txt` or `LICENSE` next to the template is used as-is.

use crate::core::error::{DevError, DevResult, ResultExt};
use crate::core::process::ToolCommand;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const LICENSE_TEMPLATE: &str = "license.tpl";
const LICENSE_FILES: [&str; 2] = ["LICENSE.txt", "LICENSE"];
const NOTICE_FILE: &str = "NOTICE.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseBundle {
  pub license: Vec<u8>,
  pub notice: Option<Vec<u8>>,
}

impl LicenseBundle {
  /// Collect the license files that sit next to `manifest_template`
  pub fn collect(manifest_template: &Path) -> DevResult<Self> {
    let dir = template_dir(manifest_template);

    let license_template = dir.join(LICENSE_TEMPLATE);
    let license = if license_template.is_file() {
      render_go_licenses(&dir, &license_template)?.into_bytes()
    } else {
      let found = LICENSE_FILES.iter().map(|name| dir.join(name)).find(|p| p.is_file());
      match found {
        Some(path) => fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
          return Err(DevError::with_help(
            "LICENSE is missing",
            format!(
              "Add {} (Go drivers) or LICENSE.txt next to {}",
              LICENSE_TEMPLATE,
              manifest_template.display()
            ),
          ));
        }
      }
    };
    if license.is_empty() {
      return Err(DevError::message("LICENSE is missing"));
    }

    let notice_path = dir.join(NOTICE_FILE);
    let notice = if notice_path.is_file() {
      Some(fs::read(&notice_path).with_context(|| format!("Failed to read {}", notice_path.display()))?)
    } else {
      None
    };

    Ok(Self { license, notice })
  }

  /// Entries in archive order
  pub fn entries(&self) -> Vec<(&'static str, &[u8])> {
    let mut entries = vec![("LICENSE", self.license.as_slice())];
    if let Some(notice) = &self.notice {
      entries.push(("NOTICE", notice.as_slice()));
    }
    entries
  }
}

fn template_dir(manifest_template: &Path) -> PathBuf {
  match manifest_template.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
    _ => PathBuf::from("."),
  }
}

/// The `module` line of `go.mod`
pub fn go_module_name(go_mod: &str) -> Option<String> {
  go_mod
    .lines()
    .find_map(|line| line.strip_prefix("module "))
    .map(|rest| rest.trim().to_string())
    .filter(|name| !name.is_empty())
}

fn render_go_licenses(dir: &Path, template: &Path) -> DevResult<String> {
  let go_mod_path = dir.join("go.mod");
  let go_mod = fs::read_to_string(&go_mod_path).with_context(|| format!("Failed to read {}", go_mod_path.display()))?;
  let module = go_module_name(&go_mod)
    .ok_or_else(|| DevError::message(format!("Could not determine module name from {}", go_mod_path.display())))?;
  let template = fs::canonicalize(template).with_context(|| format!("Failed to resolve {}", template.display()))?;

  info!("Rendering third-party licenses for {}", module);
  ToolCommand::new("go-licenses")
    .args(["report", "./...", "--ignore", module.as_str(), "--template"])
    .arg(template.to_string_lossy())
    .current_dir(dir)
    .output()
    .context("Failed to generate license")
}
