use serde::Serialize;
use std::path::Path;

#[cfg(not(debug_assertions))]
use human_panic::setup_panic;
use tracing::subscriber::{DefaultGuard, SetGlobalDefaultError};

#[cfg(debug_assertions)]
extern crate better_panic;

use tracing_subscriber::EnvFilter;

use crate::{Error, Result};

// [NOTE] tracing
//
// Progress ticks and experiment results are `info`, discarded configurations `warn`.
// Dataset and trial details are `debug`; `RUST_LOG=lagsearch=debug` shows them.

fn env_filter() -> EnvFilter {
  EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn install_logger() -> std::result::Result<(), SetGlobalDefaultError> {
  let subscriber = tracing_subscriber::fmt()
    .compact()
    .with_env_filter(env_filter())
    .with_writer(std::io::stderr)
    .finish();
  tracing::subscriber::set_global_default(subscriber)
}

pub fn init_logging() -> std::result::Result<(), SetGlobalDefaultError> {
  // Human Panic. Only enabled when *not* debugging.
  #[cfg(not(debug_assertions))]
  {
    setup_panic!();
  }

  // Better Panic. Only enabled *when* debugging.
  #[cfg(debug_assertions)]
  {
    better_panic::Settings::debug()
      .most_recent_first(false)
      .lineno_suffix(true)
      .verbosity(better_panic::Verbosity::Full)
      .install();
  }

  install_logger()?;

  Ok(())
}

/// Subscriber for the current test only; drop the guard to uninstall.
pub fn init_logging_tests() -> DefaultGuard {
  let subscriber = tracing_subscriber::fmt()
    .compact()
    .with_env_filter(env_filter())
    .with_test_writer()
    .finish();
  tracing::subscriber::set_default(subscriber)
}

pub fn serialize_to_file<T: Serialize + ?Sized>(path: &Path, obj: &T) -> Result<()> {
  let buff = serde_json::to_string_pretty(obj)?;
  std::fs::write(path, buff).map_err(|source| Error::Io {
    path: path.to_path_buf(),
    source,
  })
}
