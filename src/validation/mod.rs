//! Driver validation suite: scaffold (`init`), pytest runner (`run`), docs (`docs`)
//!
//! The scaffold is a small pytest project under `<path>/validation` that imports
//! the shared `adbc_drivers_validation` test classes and describes the driver's
//! quirks in `tests/<driver_id>.py`.

use crate::core::error::{DevError, DevResult, ResultExt};
use crate::core::process::ToolCommand;
use crate::core::vcs::{GitRepository, SystemGit};
use chrono::Datelike;
use std::fs;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use tracing::debug;

const TEMPLATES: &[(&str, &str)] = &[
  ("pytest.ini", include_str!("templates/pytest.ini")),
  ("README.md", include_str!("templates/README.md")),
  ("driver-template.md", include_str!("templates/driver-template.md")),
  ("__init__.py", include_str!("templates/__init__.py")),
  ("conftest.py", include_str!("templates/conftest.py")),
  ("driver.py", include_str!("templates/driver.py")),
  ("generate_documentation.py", include_str!("templates/generate_documentation.py")),
  ("test_file.py", include_str!("templates/test_file.py")),
  ("driver_test_uri.py", include_str!("templates/driver_test_uri.py")),
];

/// Shared suites re-exported as `tests/test_<suite>.py`
const TEST_SUITES: &[&str] = &["connection", "ingest", "query", "statement"];

/// Query directories, each seeded with `.gitkeep`
const QUERY_DIRS: &[&str] = &["ingest", "type/bind", "type/literal", "type/select"];

/// Lowercase words joined by single underscores
pub fn is_valid_driver_id(id: &str) -> bool {
  id.split('_')
    .all(|word| !word.is_empty() && word.chars().all(|c| c.is_ascii_lowercase()))
}

/// Turn a directory name into a driver id candidate
pub fn driver_id_from_name(name: &str) -> Option<String> {
  let id: String = name
    .to_lowercase()
    .chars()
    .map(|c| if c.is_ascii_lowercase() || c == '_' { c } else { '_' })
    .collect();
  let id = id.trim_matches('_');
  (!id.is_empty()).then(|| id.to_string())
}

/// Default id: the name of the enclosing git repository
pub fn default_driver_id(path: &Path) -> Option<String> {
  let git = SystemGit::open(path).ok()?;
  let name = git.workdir().file_name()?.to_string_lossy().to_string();
  driver_id_from_name(&name)
}

/// Ask for a driver id until a valid one is entered
pub fn prompt_driver_id(default: Option<&str>, input: &mut impl BufRead, output: &mut impl Write) -> DevResult<String> {
  loop {
    match default {
      Some(default) => write!(output, "Driver ID [{}]: ", default)?,
      None => write!(output, "Driver ID: ")?,
    }
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
      return Err(DevError::with_help(
        "No driver ID given",
        "Pass --driver-id when running without a terminal",
      ));
    }
    let id = match line.trim() {
      "" => default.unwrap_or_default(),
      entered => entered,
    };

    if id.is_empty() {
      writeln!(output, "Driver ID cannot be empty")?;
    } else if is_valid_driver_id(id) {
      return Ok(id.to_string());
    } else {
      writeln!(output, "Invalid driver ID. Use lowercase letters and underscores (not at ends).")?;
    }
  }
}

/// `my_driver` -> `MyDriver`
fn class_name(id: &str) -> String {
  id.split('_')
    .map(|part| {
      let mut chars = part.chars();
      match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
      }
    })
    .collect()
}

/// `my_driver` -> `My Driver`
fn display_name(id: &str) -> String {
  id.split('_')
    .map(class_name)
    .collect::<Vec<_>>()
    .join(" ")
}

/// Relative path and content of every scaffold file, in creation order
pub fn render_scaffold(driver_id: &str, year: i32) -> DevResult<Vec<(PathBuf, String)>> {
  let mut tera = Tera::default();
  tera.add_raw_templates(TEMPLATES.to_vec())?;

  let mut ctx = Context::new();
  ctx.insert("year", &year);
  ctx.insert("driver_id", driver_id);
  ctx.insert("driver_id_upper", &driver_id.to_uppercase());
  ctx.insert("driver_name", &display_name(driver_id));
  ctx.insert("class_name", &class_name(driver_id));

  let mut files = Vec::new();
  for dir in QUERY_DIRS {
    files.push((Path::new("queries").join(dir).join(".gitkeep"), String::new()));
  }
  for name in ["pytest.ini", "README.md", "driver-template.md"] {
    files.push((PathBuf::from(name), tera.render(name, &ctx)?));
  }

  let tests = Path::new("tests");
  files.push((tests.join("__init__.py"), tera.render("__init__.py", &ctx)?));
  files.push((tests.join("conftest.py"), tera.render("conftest.py", &ctx)?));
  files.push((tests.join(format!("{}.py", driver_id)), tera.render("driver.py", &ctx)?));
  files.push((
    tests.join("generate_documentation.py"),
    tera.render("generate_documentation.py", &ctx)?,
  ));
  for suite in TEST_SUITES {
    let mut suite_ctx = ctx.clone();
    suite_ctx.insert("test_name", suite);
    suite_ctx.insert("test_class_name", &class_name(suite));
    files.push((
      tests.join(format!("test_{}.py", suite)),
      tera.render("test_file.py", &suite_ctx)?,
    ));
  }
  files.push((
    tests.join(driver_id).join("test_uri.py"),
    tera.render("driver_test_uri.py", &ctx)?,
  ));
  Ok(files)
}

fn validation_dir(path: &Path) -> DevResult<PathBuf> {
  let target = path
    .canonicalize()
    .with_context(|| format!("{} does not exist", path.display()))?;
  Ok(target.join("validation"))
}

/// Create `<path>/validation`; prompts for the id when `driver_id` is `None`
pub fn init(path: &Path, driver_id: Option<String>) -> DevResult<PathBuf> {
  let dir = validation_dir(path)?;
  if dir.exists() {
    return Err(DevError::message(format!("{} already exists", dir.display())));
  }

  let driver_id = match driver_id {
    Some(id) if is_valid_driver_id(&id) => id,
    Some(id) => {
      return Err(DevError::with_help(
        format!("Invalid driver ID: {}", id),
        "Use lowercase letters and underscores (not at ends)",
      ));
    }
    None => {
      let default = default_driver_id(path);
      debug!("Default driver ID: {:?}", default);
      let stdin = std::io::stdin();
      prompt_driver_id(default.as_deref(), &mut stdin.lock(), &mut std::io::stdout())?
    }
  };

  for (relative, content) in render_scaffold(&driver_id, chrono::Local::now().year())? {
    let file = dir.join(relative);
    if let Some(parent) = file.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&file, content).with_context(|| format!("Failed to write {}", file.display()))?;
  }

  println!("✓ Created validation suite structure at {}", dir.display());
  println!("✓ Driver ID: {}", driver_id);
  println!("\nNext steps:");
  println!("  1. Build your driver shared library:");
  println!(
    "     The validation suite expects your driver to be in: build/libadbc_driver_{}.{{so,dylib,dll}}.",
    driver_id
  );
  println!("     You can customize this in validation/tests/conftest.py");
  println!(
    "  2. Optional. Update validation/tests/{}.py with driver-specific features and quirks",
    driver_id
  );
  println!("  3. Run validation suite with: adbc-drivers-dev validation run");
  println!("  4. Generate documentation with: adbc-drivers-dev validation docs");
  Ok(dir)
}

fn missing_scaffold(path: &Path) -> DevError {
  DevError::with_help(
    format!("{} does not exist", path.display()),
    "Run 'adbc-drivers-dev validation init' first to create the validation structure",
  )
}

pub fn pytest_command(dir: &Path, extra_args: &[String]) -> ToolCommand {
  ToolCommand::new("pytest")
    .args(["-vvs", "--junit-xml=validation-report.xml", "-rfEsxX"])
    .arg(dir.join("tests").to_string_lossy())
    .args(extra_args.iter().cloned())
    .current_dir(dir)
}

/// Run the suite; pytest's exit code becomes ours
pub fn run(path: &Path, extra_args: &[String]) -> DevResult<()> {
  let dir = validation_dir(path)?;
  if !dir.is_dir() {
    return Err(missing_scaffold(&dir));
  }
  pytest_command(&dir, extra_args).run()
}

/// Render `docs/` from the last run's report
pub fn docs(path: &Path) -> DevResult<()> {
  let dir = validation_dir(path)?;
  let script = dir.join("tests").join("generate_documentation.py");
  if !script.is_file() {
    return Err(missing_scaffold(&script));
  }
  ToolCommand::new("python")
    .args(["-m", "tests.generate_documentation"])
    .current_dir(&dir)
    .run()?;
  println!("✓ Documentation generated in {}", dir.join("docs").display());
  Ok(())
}
