use crate::build::{self, BuildOptions};
use crate::core::error::DevResult;
use std::path::Path;

/// Build the driver from the repository at `repo_root`
pub fn run_build(repo_root: &Path, options: &BuildOptions) -> DevResult<()> {
  let output = build::build(repo_root, options)?;
  println!("Built {}", output.display());
  Ok(())
}

/// Check the library previously built for `driver`
pub fn run_check(repo_root: &Path, driver: &str) -> DevResult<()> {
  let binary = build::check(repo_root, driver)?;
  println!("{} passed binary checks", binary.display());
  Ok(())
}
