//! Strongly typed tokens and related errors.
//!
//! These types are shared between the individual credential sources, the
//! resolver, and the CLI so that callers can reason about tokens and failure
//! modes consistently.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// The authorization scheme a [`Token`] is presented with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenType {
  /// `Authorization: Bearer <token>`
  #[default]
  Bearer,
}

impl fmt::Display for TokenType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Bearer => write!(f, "Bearer"),
    }
  }
}

/// An access token for the GitHub API.
///
/// Static sources (environment, `.netrc`, `gh`) never set an expiry; GitHub
/// App installation tokens carry the expiry reported by the API.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
  /// The opaque secret sent to the API
  pub access_token: String,
  /// Scheme used in the `Authorization` header
  pub token_type: TokenType,
  /// When the token stops being accepted, if known
  pub expires_at: Option<DateTime<Utc>>,
}

impl Token {
  /// Create a non-expiring bearer token.
  pub fn bearer(access_token: impl Into<String>) -> Self {
    Self {
      access_token: access_token.into(),
      token_type: TokenType::Bearer,
      expires_at: None,
    }
  }

  /// Attach an expiry to the token.
  pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
    self.expires_at = Some(expires_at);
    self
  }

  /// Value for the `Authorization` header.
  pub fn authorization(&self) -> String {
    format!("{} {}", self.token_type, self.access_token)
  }

  /// Whether the token is still usable `leeway` from `now`.
  pub fn is_valid_at(&self, now: DateTime<Utc>, leeway: chrono::Duration) -> bool {
    match self.expires_at {
      Some(expires_at) => now + leeway < expires_at,
      None => true,
    }
  }

  /// Masked rendering for display, keeping only the first four characters.
  pub fn masked(&self) -> String {
    let token = &self.access_token;
    if token.chars().count() > 8 {
      let prefix: String = token.chars().take(4).collect();
      format!("{prefix}{}", "*".repeat(token.chars().count() - 4))
    } else {
      "*".repeat(token.chars().count())
    }
  }
}

impl fmt::Debug for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Token")
      .field("access_token", &"<redacted>")
      .field("token_type", &self.token_type)
      .field("expires_at", &self.expires_at)
      .finish()
  }
}

/// Errors that can occur while resolving a credential from a single source.
#[derive(Debug)]
pub enum AuthError {
  /// A required value was neither passed explicitly nor set in the environment
  NotSet(&'static str),
  /// None of the static token variables were set
  NoEnvironmentToken,
  /// The GitHub App private key could not be parsed
  InvalidPrivateKey(String),
  /// A credential file could not be read
  ReadFile { path: PathBuf, source: std::io::Error },
  /// Neither `HOME` nor `USERPROFILE` is set
  NoHomeDirectory,
  /// The `.netrc` file is malformed
  NetrcParse { path: PathBuf, message: String },
  /// The `.netrc` file has no usable entry for the host
  NetrcEntryNotFound { path: PathBuf, host: String },
  /// The `gh` executable could not be located
  CliNotFound(String),
  /// The `gh` executable could not be started or exited unsuccessfully
  CommandFailed { command: String, message: String },
  /// The `gh` executable printed nothing
  EmptyCliToken { command: String },
  /// The installation token exchange was rejected or returned garbage
  TokenExchange(String),
  /// The installation token exchange failed at the HTTP layer
  Http(reqwest::Error),
}

impl fmt::Display for AuthError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::NotSet(var) => write!(f, "{var} is not set"),
      Self::NoEnvironmentToken => write!(f, "no token found in environment variables"),
      Self::InvalidPrivateKey(msg) => write!(f, "failed to parse GitHub App private key: {msg}"),
      Self::ReadFile { path, source } => write!(f, "failed to read {}: {source}", path.display()),
      Self::NoHomeDirectory => write!(f, "could not determine home directory (HOME is not set)"),
      Self::NetrcParse { path, message } => write!(f, "failed to parse {}: {message}", path.display()),
      Self::NetrcEntryNotFound { path, host } => {
        write!(f, "no token found in {} for host {host}", path.display())
      }
      Self::CliNotFound(msg) => write!(f, "gh CLI not found in PATH: {msg}"),
      Self::CommandFailed { command, message } => write!(f, "failed to execute {command}: {message}"),
      Self::EmptyCliToken { command } => write!(f, "{command} returned empty token"),
      Self::TokenExchange(msg) => write!(f, "installation token exchange failed: {msg}"),
      Self::Http(err) => write!(f, "installation token request failed: {err}"),
    }
  }
}

impl std::error::Error for AuthError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::ReadFile { source, .. } => Some(source),
      Self::Http(err) => Some(err),
      _ => None,
    }
  }
}

impl From<reqwest::Error> for AuthError {
  fn from(err: reqwest::Error) -> Self {
    Self::Http(err)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_bearer_authorization_header() {
    let token = Token::bearer("abc123");
    assert_eq!(token.token_type, TokenType::Bearer);
    assert_eq!(token.authorization(), "Bearer abc123");
    assert!(token.expires_at.is_none());
  }

  #[test]
  fn test_debug_redacts_secret() {
    let token = Token::bearer("super-secret-value");
    let debug_str = format!("{token:?}");
    assert!(debug_str.contains("<redacted>"));
    assert!(!debug_str.contains("super-secret-value"));
  }

  #[test]
  fn test_masked() {
    assert_eq!(Token::bearer("ghp_abcdefgh").masked(), "ghp_********");
    assert_eq!(Token::bearer("short").masked(), "*****");
  }

  #[test]
  fn test_validity_window() {
    let now = Utc::now();
    let token = Token::bearer("t").with_expiry(now + chrono::Duration::minutes(5));

    assert!(token.is_valid_at(now, chrono::Duration::minutes(1)));
    assert!(!token.is_valid_at(now, chrono::Duration::minutes(5)));
    assert!(Token::bearer("t").is_valid_at(now, chrono::Duration::days(365)));
  }

  #[test]
  fn test_auth_error_display() {
    assert_eq!(AuthError::NotSet("GH_APP_ID").to_string(), "GH_APP_ID is not set");
    assert_eq!(
      AuthError::NoEnvironmentToken.to_string(),
      "no token found in environment variables"
    );
    assert_eq!(
      AuthError::NetrcEntryNotFound {
        path: PathBuf::from("/home/me/.netrc"),
        host: "github.com".to_string(),
      }
      .to_string(),
      "no token found in /home/me/.netrc for host github.com"
    );
    assert_eq!(
      AuthError::EmptyCliToken {
        command: "gh auth token --hostname github.com".to_string()
      }
      .to_string(),
      "gh auth token --hostname github.com returned empty token"
    );
  }

  #[test]
  fn test_auth_error_source() {
    use std::error::Error;

    assert!(AuthError::NoEnvironmentToken.source().is_none());

    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err = AuthError::ReadFile {
      path: PathBuf::from("key.pem"),
      source: io_err,
    };
    assert!(err.source().is_some());
    assert!(err.to_string().starts_with("failed to read key.pem"));
  }
}
