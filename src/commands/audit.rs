use crate::checks::{copyright, rat};
use crate::core::error::DevResult;
use std::path::Path;

pub fn run_copyright(root: &Path, holder: &str) -> DevResult<()> {
  copyright::run(root, holder)
}

pub fn run_licenses(root: &Path) -> DevResult<()> {
  rat::run(root)
}
