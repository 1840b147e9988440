//! Environment lookups: host resolution and static tokens.
//!
//! Every credential source reads the process environment through the
//! [`Environment`] trait so tests can supply a synthetic environment instead
//! of mutating real process state.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::debug;

use super::{AuthError, Token};

/// Host used when `GH_HOST` is not set.
pub const DEFAULT_HOST: &str = "github.com";

/// Variables holding a static token, in priority order.
pub const TOKEN_VARS: [&str; 4] = ["GH_TOKEN", "GITHUB_TOKEN", "GH_ENTERPRISE_TOKEN", "GITHUB_ENTERPRISE_TOKEN"];

/// Read access to environment variables.
pub trait Environment: Send + Sync {
  /// Raw value of `key`, if set.
  fn var(&self, key: &str) -> Option<String>;

  /// Value of `key`, treating an empty string the same as an unset variable.
  fn non_empty(&self, key: &str) -> Option<String> {
    self.var(key).filter(|value| !value.is_empty())
  }
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
  fn var(&self, key: &str) -> Option<String> {
    std::env::var(key).ok()
  }
}

impl Environment for HashMap<String, String> {
  fn var(&self, key: &str) -> Option<String> {
    self.get(key).cloned()
  }
}

/// Return the GitHub host from `GH_HOST`, defaulting to `github.com`.
pub fn resolve_host(env: &dyn Environment) -> String {
  env.non_empty("GH_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string())
}

/// REST API root for a host.
///
/// `github.com` is served from `api.github.com`; GitHub Enterprise Server
/// serves the API under `/api/v3` on the instance itself.
pub fn api_base_url(host: &str) -> String {
  if host == DEFAULT_HOST {
    "https://api.github.com".to_string()
  } else {
    format!("https://{host}/api/v3")
  }
}

/// Read a static token from the first non-empty variable in [`TOKEN_VARS`].
///
/// # Errors
/// Returns [`AuthError::NoEnvironmentToken`] when none of them is set.
pub fn static_token_from_environment(env: &dyn Environment) -> Result<Token, AuthError> {
  for key in TOKEN_VARS {
    if let Some(token) = env.non_empty(key) {
      debug!(var = key, "found token in environment");
      return Ok(Token::bearer(token));
    }
  }
  Err(AuthError::NoEnvironmentToken)
}

/// The user's home directory according to `HOME` (or `USERPROFILE`).
pub(crate) fn home_dir(env: &dyn Environment) -> Option<PathBuf> {
  env
    .non_empty("HOME")
    .or_else(|| env.non_empty("USERPROFILE"))
    .map(PathBuf::from)
}
