//! Diagnostic logging setup
//!
//! Logs go to stderr so stdout stays reserved for command output (versions,
//! changelogs, generated file lists). `RUST_LOG` overrides the level chosen
//! on the command line.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Level used when `RUST_LOG` is unset
pub fn default_level(verbose: bool) -> Level {
  if verbose { Level::DEBUG } else { Level::WARN }
}

/// Install the global subscriber; later calls are no-ops
pub fn init_tracing(json: bool, level: Level) {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

  if json {
    tracing_subscriber::registry()
      .with(env_filter)
      .with(fmt::layer().with_target(false).with_writer(std::io::stderr).json())
      .try_init()
      .ok();
  } else {
    tracing_subscriber::registry()
      .with(env_filter)
      .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
      .try_init()
      .ok();
  }
}
