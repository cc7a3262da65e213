use crate::core::error::{DevResult, ResultExt};
use crate::package::archive::write_package;
use crate::package::index::{INDEX_FILE, PackageIndex};
use crate::package::license::LicenseBundle;
use crate::package::naming::find_drivers;
use crate::package::{PackageAssembler, generate_packages, manifest};
use std::fs;
use std::path::PathBuf;

/// Arguments of `package`
#[derive(Debug, Clone)]
pub struct PackageArgs {
  pub output: PathBuf,
  pub name: String,
  pub root: PathBuf,
  pub manifest_template: PathBuf,
  pub release: bool,
  pub inputs: Vec<PathBuf>,
}

/// Bundle every built binary of `args.name` and write the index
pub fn run_package(args: &PackageArgs) -> DevResult<()> {
  let drivers = find_drivers(&args.name, &args.inputs)?;
  fs::create_dir_all(&args.output).with_context(|| format!("Failed to create {}", args.output.display()))?;

  let licenses = LicenseBundle::collect(&args.manifest_template)?;
  let template = manifest::load(&args.manifest_template)?;
  let assembler = PackageAssembler::new(template, args.name.clone());

  let mut packages = generate_packages(&assembler, &args.root, &drivers, args.release)?;
  for package in &mut packages {
    println!(
      "Generating {} {} {} {}",
      package.name, package.platform, package.architecture, package.version
    );
    for (name, data) in licenses.entries() {
      package.files.insert(name.to_string(), data.to_vec());
    }
    let output = write_package(&args.output, package)?;
    println!("Output: {}", output.display());
  }

  let index = PackageIndex::build(assembler.template(), &args.name, &packages)?.to_yaml()?;
  let index_path = args.output.join(INDEX_FILE);
  fs::write(&index_path, &index).with_context(|| format!("Failed to write {}", index_path.display()))?;
  println!("Generated {}", INDEX_FILE);
  print!("{}", index);
  Ok(())
}
