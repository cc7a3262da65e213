use crate::core::error::DevResult;
use crate::release::version;
use std::path::Path;

/// Print the version of the driver at `driver_root`
pub fn run_version(driver_root: &Path, strict: bool) -> DevResult<()> {
  println!("{}", version::resolve(driver_root, strict)?);
  Ok(())
}
