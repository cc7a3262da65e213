//! Integration tests: drive the compiled binary against throwaway git repositories

mod helpers;
mod test_changelog;
mod test_checks;
mod test_generate;
mod test_package;
mod test_release;
mod test_validation;
mod test_version;
