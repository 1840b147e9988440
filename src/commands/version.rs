//! Version/metadata reporting.
//!
//! Implements `gh-auth version`, printing either a colored summary or a JSON
//! document describing the build.

use serde::Serialize;

use crate::color::ColorScheme;

/// Build metadata embedded by `build.rs`.
#[derive(Debug, Serialize)]
struct BuildInfo {
  version: &'static str,
  git_commit: &'static str,
  build_timestamp: String,
  target: &'static str,
  rust_version: &'static str,
}

impl BuildInfo {
  fn current() -> Self {
    Self {
      version: env!("CARGO_PKG_VERSION"),
      git_commit: env!("GIT_HASH"),
      build_timestamp: format_timestamp(env!("BUILD_TIMESTAMP")),
      target: env!("TARGET"),
      rust_version: env!("RUSTC_VERSION"),
    }
  }
}

/// Render version and build metadata in JSON or human-readable form.
///
/// # Arguments
/// * `json` - Emit a JSON document instead of colored text.
/// * `short` - Print only the semantic version string.
/// * `colors` - Shared color palette for styled terminal output.
pub(crate) fn handle_version_command(json: bool, short: bool, colors: &ColorScheme) {
  let info = BuildInfo::current();

  if short {
    println!("{}", info.version);
    return;
  }

  if json {
    match serde_json::to_string_pretty(&info) {
      Ok(doc) => println!("{doc}"),
      Err(e) => {
        eprintln!("{} {e}", colors.error("Error:"));
        std::process::exit(1);
      }
    }
    return;
  }

  println!("{} {}", colors.emphasis("gh-auth"), colors.number(info.version));
  println!("{}: {}", colors.emphasis("Git commit"), colors.code(info.git_commit));
  println!("{}: {}", colors.emphasis("Built"), colors.dimmed(&info.build_timestamp));
  println!("{}: {}", colors.emphasis("Target"), info.target);
  println!("{}: {}", colors.emphasis("Rust version"), info.rust_version);
}

/// Turn Unix epoch seconds into `YYYY-MM-DD HH:MM:SS UTC`, or return the
/// input unchanged when it is not a timestamp.
fn format_timestamp(timestamp: &str) -> String {
  timestamp
    .parse::<i64>()
    .ok()
    .and_then(|secs| chrono::DateTime::<chrono::Utc>::from_timestamp(secs, 0))
    .map(|datetime| datetime.format("%Y-%m-%d %H:%M:%S UTC").to_string())
    .unwrap_or_else(|| timestamp.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_format_timestamp() {
    assert_eq!(format_timestamp("0"), "1970-01-01 00:00:00 UTC");
    assert_eq!(format_timestamp("1700000000"), "2023-11-14 22:13:20 UTC");
    assert_eq!(format_timestamp("unknown"), "unknown");
  }

  #[test]
  fn test_build_info_json_fields() {
    let value = serde_json::to_value(BuildInfo::current()).unwrap();
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
    for field in ["git_commit", "build_timestamp", "target", "rust_version"] {
      assert!(value.get(field).is_some(), "{field}");
    }
  }
}
