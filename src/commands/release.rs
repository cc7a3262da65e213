use crate::core::error::DevResult;
use crate::core::vcs::SystemGit;
use crate::release::changelog::{Changelog, ChangelogBuilder};
use crate::release::publish::{self, ReleaseTag};
use std::path::Path;
use tracing::info;

fn print_changelog(changelog: &Changelog) {
  println!("# {}", changelog.title());
  println!();
  println!("{}", changelog.body());
}

/// Print the changelog of `subpath` for `from..to`
pub fn run_changelog(root: &Path, subpath: &str, version: &str, from: Option<&str>, to: &str) -> DevResult<()> {
  let repo = SystemGit::open(root)?;
  let changelog = ChangelogBuilder::new(&repo).build(subpath, version, from, to)?;
  print_changelog(&changelog);
  Ok(())
}

/// Draft a GitHub release for `tag`
pub fn run_release(root: &Path, tag: &str, dry_run: bool) -> DevResult<()> {
  let release = ReleaseTag::parse(tag)?;
  let repo = SystemGit::open(root)?;
  info!("Releasing {} ({} in {})", tag, release.version, release.subdir);

  let changelog = publish::release_changelog(&repo, &release)?;
  print_changelog(&changelog);
  publish::publish(root, &changelog, tag, dry_run)
}
