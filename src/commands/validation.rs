use crate::core::error::DevResult;
use crate::validation;
use std::path::Path;

pub fn run_validation_init(path: &Path, driver_id: Option<String>) -> DevResult<()> {
  validation::init(path, driver_id).map(|_| ())
}

pub fn run_validation_run(path: &Path, pytest_args: &[String]) -> DevResult<()> {
  validation::run(path, pytest_args)
}

pub fn run_validation_docs(path: &Path) -> DevResult<()> {
  validation::docs(path)
}
