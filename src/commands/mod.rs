//! CLI subcommand handlers.
//!
//! One module per `gh-auth` subcommand. Handlers print to stdout/stderr and
//! exit the process with a non-zero code on failure.

use std::fmt::Display;
use std::process;

use anyhow::{Context, Result};

use crate::color::ColorScheme;

pub mod api;
pub mod completions;
pub mod status;
pub mod token;
pub mod version;

/// Exit code when no credential source produced credentials.
pub(crate) const EXIT_NO_CREDENTIALS: i32 = 2;

/// Print `✗ <title>` followed by the indented error, then exit with `code`.
pub(crate) fn fail(colors: &ColorScheme, title: &str, err: impl Display, code: i32) -> ! {
  eprintln!("{} {}", colors.error("✗"), colors.error(title));
  for line in err.to_string().lines() {
    eprintln!("  {line}");
  }
  process::exit(code);
}

/// Run credential lookups, which read files and may spawn `gh`, on tokio's
/// blocking pool.
pub(crate) async fn run_blocking<T, F>(lookup: F) -> Result<T>
where
  F: FnOnce() -> T + Send + 'static,
  T: Send + 'static,
{
  tokio::task::spawn_blocking(lookup)
    .await
    .context("credential lookup task failed")
}
