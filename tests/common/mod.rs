//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use gh_auth::Resolver;
use gh_auth::credentials::SourceOverrides;

/// An environment containing exactly `vars`.
pub fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
  vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

/// PKCS#1 private key for signing App JWTs.
pub fn app_private_key_path() -> PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/app-private-key.pem")
}

/// Overrides that keep the netrc source away from the real home directory.
pub fn isolated_overrides() -> SourceOverrides {
  SourceOverrides {
    netrc_path: Some(PathBuf::from("/nonexistent/gh-auth-tests/.netrc")),
    ..SourceOverrides::default()
  }
}

/// Resolver over `vars` only, with netrc pointed at a missing file and no
/// `PATH` to find `gh` on unless `vars` provides one.
pub fn isolated_resolver(vars: &[(&str, &str)]) -> Resolver {
  Resolver::new()
    .with_environment(env(vars))
    .with_overrides(isolated_overrides())
}

/// Write an executable `gh` into `dir` that records its arguments in
/// `dir/args` and prints `output`.
#[cfg(unix)]
pub fn write_gh_stub(dir: &Path, output: &str) -> PathBuf {
  use std::os::unix::fs::PermissionsExt;

  let path = dir.join("gh");
  let script = format!("#!/bin/sh\necho \"$@\" > \"$(dirname \"$0\")/args\"\nprintf '{output}'\n");
  std::fs::write(&path, script).unwrap();
  std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
  path
}
