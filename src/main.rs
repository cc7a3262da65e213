mod build;
mod checks;
mod commands;
mod core;
mod package;
mod release;
mod ui;
mod utils;
mod validation;
mod workflow;

use clap::{ArgAction, Parser, Subcommand};
use core::error::{DevError, print_error};
use std::path::PathBuf;

/// Developer tooling for ADBC driver repositories
#[derive(Parser)]
#[command(name = "adbc-drivers-dev")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Log debug output and echo every external command
  #[arg(
    short,
    long,
    global = true,
    env = "VERBOSE",
    action = ArgAction::SetTrue,
    value_parser = utils::parse_bool
  )]
  verbose: bool,

  /// Emit logs as JSON lines
  #[arg(long, global = true)]
  log_json: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Workflows
  // ============================================================================
  /// Generate CI workflows from .github/workflows/generate.toml
  Generate {
    /// Repository root
    #[arg(default_value = ".")]
    repository: PathBuf,
  },

  /// Print the JSON Schema for generate.toml
  Schema,

  /// Pin GitHub Actions in workflow templates to their latest release
  UpdateActions {
    /// Directory containing *.yaml templates
    templates: PathBuf,
  },

  // ============================================================================
  // Releases & Packaging
  // ============================================================================
  /// Print the version of a driver, derived from git tags
  Version {
    /// Driver directory (holding go.mod or Cargo.toml)
    driver_root: PathBuf,
    /// Fail unless HEAD is exactly on a tag and the tree is clean
    #[arg(long)]
    strict: bool,
  },

  /// Print the changelog for a driver between two refs
  Changelog {
    /// Repository root
    root: PathBuf,
    /// Driver subdirectory ("." for the whole repository)
    subpath: String,
    /// Version shown in the title
    #[arg(id = "changelog_version", value_name = "VERSION")]
    version: String,
    /// Start of the range (exclusive); omit to start from the beginning
    #[arg(long)]
    from: Option<String>,
    /// End of the range (inclusive)
    #[arg(long)]
    to: String,
  },

  /// Draft a GitHub release for a tag
  Release {
    /// Repository root
    root: PathBuf,
    /// Tag to release (vX.Y.Z or <driver>/vX.Y.Z)
    tag: String,
    /// Print the gh command instead of running it
    #[arg(long)]
    dry_run: bool,
  },

  /// Bundle built drivers into archives plus a manifest.yaml index
  Package {
    /// Directory to write generated packages to
    #[arg(short, long)]
    output: PathBuf,
    /// The driver name
    #[arg(long)]
    name: String,
    /// Path to the driver in version control (to infer the version)
    #[arg(long)]
    root: PathBuf,
    /// The manifest template
    #[arg(long)]
    manifest_template: PathBuf,
    /// This is a release (require an exact, clean tag)
    #[arg(long)]
    release: bool,
    /// Input directories named drivers-<platform>-<arch>
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
  },

  // ============================================================================
  // Builds
  // ============================================================================
  /// Build a driver shared library into build/
  Build {
    /// Driver name
    #[arg(long, env = "DRIVER")]
    driver: String,
    /// Implementation language (go or rust)
    #[arg(long, env = "IMPL_LANG", default_value = "go", value_parser = parse_lang)]
    lang: build::Lang,
    /// Build inside the manylinux container (Linux only)
    #[arg(
      long,
      env = "CI",
      action = ArgAction::SetTrue,
      value_parser = utils::parse_bool
    )]
    ci: bool,
    /// Debug build (Go: assert tag; Rust: no --release)
    #[arg(
      long,
      env = "DEBUG",
      action = ArgAction::SetTrue,
      value_parser = utils::parse_bool
    )]
    debug: bool,
    /// Extra Go build tags, comma separated
    #[arg(long, env = "BUILD_TAGS", default_value = "")]
    build_tags: String,
    /// Extra Cargo features, comma separated
    #[arg(long, env = "FEATURES", default_value = "")]
    features: String,
    /// Extra docker volumes for the container build, comma separated
    #[arg(long, env = "ADDITIONAL_VOLUMES", default_value = "")]
    volumes: String,
  },

  /// Check a built driver's exported symbols and platform minimums
  Check {
    /// Driver name
    #[arg(long, env = "DRIVER")]
    driver: String,
  },

  // ============================================================================
  // Repository checks
  // ============================================================================
  /// Check that files carry a current-year copyright header
  Copyright {
    /// Repository root
    #[arg(default_value = ".")]
    root: PathBuf,
    /// Copyright holder expected in the header
    #[arg(long, default_value = checks::copyright::DEFAULT_HOLDER)]
    holder: String,
  },

  /// Audit licenses with Apache RAT and check ADBC headers
  Licenses {
    /// Repository root
    #[arg(default_value = ".")]
    root: PathBuf,
  },

  /// Manage the driver validation suite
  #[command(subcommand)]
  Validation(ValidationCommands),
}

#[derive(Subcommand)]
enum ValidationCommands {
  /// Initialize the validation folder structure
  Init {
    /// Target directory
    #[arg(long, default_value = ".")]
    path: PathBuf,
    /// Driver ID (prompted for when omitted)
    #[arg(long)]
    driver_id: Option<String>,
  },

  /// Run the validation test suite
  Run {
    /// Target directory
    #[arg(long, default_value = ".")]
    path: PathBuf,
    /// Additional arguments to pass to pytest
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pytest_args: Vec<String>,
  },

  /// Generate documentation from validation results
  Docs {
    /// Target directory
    #[arg(long, default_value = ".")]
    path: PathBuf,
  },
}

fn parse_lang(value: &str) -> Result<build::Lang, String> {
  build::Lang::parse(value).map_err(|e| e.to_string())
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();

  core::process::set_verbose(cli.verbose);
  core::telemetry::init_tracing(cli.log_json, core::telemetry::default_level(cli.verbose));

  let current_dir = match std::env::current_dir() {
    Ok(dir) => dir,
    Err(e) => handle_error(DevError::from(e).context("Failed to get current directory")),
  };

  let result = match cli.command {
    // Workflows
    Commands::Generate { repository } => commands::run_generate(&repository),
    Commands::Schema => commands::run_schema(),
    Commands::UpdateActions { templates } => commands::run_update_actions(&templates),

    // Releases & Packaging
    Commands::Version { driver_root, strict } => commands::run_version(&driver_root, strict),
    Commands::Changelog {
      root,
      subpath,
      version,
      from,
      to,
    } => commands::run_changelog(&root, &subpath, &version, from.as_deref(), &to),
    Commands::Release { root, tag, dry_run } => commands::run_release(&root, &tag, dry_run),
    Commands::Package {
      output,
      name,
      root,
      manifest_template,
      release,
      inputs,
    } => commands::run_package(&commands::PackageArgs {
      output,
      name,
      root,
      manifest_template,
      release,
      inputs,
    }),

    // Builds
    Commands::Build {
      driver,
      lang,
      ci,
      debug,
      build_tags,
      features,
      volumes,
    } => {
      let options = build::BuildOptions {
        driver,
        lang,
        ci,
        debug,
        build_tags: utils::split_list(&build_tags),
        features: utils::split_list(&features),
        volumes: utils::split_list(&volumes),
      };
      commands::run_build(&current_dir, &options)
    }
    Commands::Check { driver } => commands::run_check(&current_dir, &driver),

    // Repository checks
    Commands::Copyright { root, holder } => commands::run_copyright(&root, &holder),
    Commands::Licenses { root } => commands::run_licenses(&root),

    // Validation
    Commands::Validation(validation_cmd) => match validation_cmd {
      ValidationCommands::Init { path, driver_id } => commands::run_validation_init(&path, driver_id),
      ValidationCommands::Run { path, pytest_args } => commands::run_validation_run(&path, &pytest_args),
      ValidationCommands::Docs { path } => commands::run_validation_docs(&path),
    },
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: DevError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
