//! GitHub App installation tokens.
//!
//! A GitHub App authenticates as one of its installations by signing a
//! short-lived JWT with the App's private key and exchanging it for an
//! installation access token:
//!
//! ```text
//! POST {api}/app/installations/{installation_id}/access_tokens
//! Authorization: Bearer <app JWT>
//! ```
//!
//! Installation tokens expire after an hour, so [`InstallationTokenSource`]
//! caches the current one and re-exchanges shortly before it lapses.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::env::{Environment, api_base_url, resolve_host};
use super::{AuthError, Token, TokenSource};
use crate::transport::{default_client, user_agent};

/// Substrings that mark a value as inline PEM rather than a file path.
const PEM_MARKERS: [&str; 2] = ["-BEGIN RSA PRIVATE KEY-", "-BEGIN PRIVATE KEY-"];

/// Tokens this close to expiry are exchanged again.
const REFRESH_LEEWAY_SECS: i64 = 60;

/// GitHub rejects App JWTs that live longer than ten minutes.
const JWT_LIFETIME_SECS: i64 = 9 * 60;

/// Backdate `iat` to tolerate clock drift between us and GitHub.
const JWT_BACKDATE_SECS: i64 = 60;

#[derive(Debug, Serialize, Deserialize)]
struct AppClaims {
  iat: i64,
  exp: i64,
  iss: String,
}

#[derive(Debug, Deserialize)]
struct InstallationTokenResponse {
  token: String,
  expires_at: Option<DateTime<Utc>>,
}

/// A [`TokenSource`] issuing installation tokens for one GitHub App
/// installation.
pub struct InstallationTokenSource {
  app_id: String,
  installation_id: String,
  key: EncodingKey,
  base_url: String,
  client: reqwest::Client,
  cached: Mutex<Option<Token>>,
}

/// Build an installation token source.
///
/// Each argument falls back to its environment variable when `None`:
/// `GH_APP_ID`, `GH_APP_INSTALLATION_ID` and `GH_APP_PRIVATE_KEY`. The private
/// key may be inline PEM text or a path to a PEM file. When the resolved host
/// is not `github.com` the source targets the Enterprise API at
/// `https://<host>/api/v3`.
///
/// # Errors
/// Returns [`AuthError::NotSet`] naming the first missing variable, or an
/// error when the private key cannot be read or parsed.
pub fn app_installation_token_source(
  env: &dyn Environment,
  app_id: Option<&str>,
  installation_id: Option<&str>,
  private_key: Option<&str>,
) -> Result<InstallationTokenSource, AuthError> {
  let app_id = explicit_or_env(env, app_id, "GH_APP_ID")?;
  let installation_id = explicit_or_env(env, installation_id, "GH_APP_INSTALLATION_ID")?;
  let private_key = explicit_or_env(env, private_key, "GH_APP_PRIVATE_KEY")?;

  let key = load_private_key(&private_key)?;
  let base_url = api_base_url(&resolve_host(env));

  debug!(app_id = %app_id, installation_id = %installation_id, base_url = %base_url, "configured GitHub App");

  Ok(InstallationTokenSource {
    app_id,
    installation_id,
    key,
    base_url,
    client: default_client(),
    cached: Mutex::new(None),
  })
}

fn explicit_or_env(env: &dyn Environment, explicit: Option<&str>, var: &'static str) -> Result<String, AuthError> {
  explicit
    .filter(|value| !value.is_empty())
    .map(str::to_string)
    .or_else(|| env.non_empty(var))
    .ok_or(AuthError::NotSet(var))
}

/// Whether `value` holds PEM text instead of naming a file.
pub(crate) fn is_inline_pem(value: &str) -> bool {
  PEM_MARKERS.iter().any(|marker| value.contains(marker))
}

/// Parse inline PEM, or read and parse the file `value` points at.
fn load_private_key(value: &str) -> Result<EncodingKey, AuthError> {
  if is_inline_pem(value) {
    return parse_private_key(value.as_bytes());
  }

  let path = Path::new(value);
  let pem = std::fs::read(path).map_err(|source| AuthError::ReadFile {
    path: path.to_path_buf(),
    source,
  })?;
  parse_private_key(&pem)
}

fn parse_private_key(pem: &[u8]) -> Result<EncodingKey, AuthError> {
  EncodingKey::from_rsa_pem(pem).map_err(|err| AuthError::InvalidPrivateKey(err.to_string()))
}

impl InstallationTokenSource {
  /// Target a different API root (GitHub Enterprise, or a test server).
  pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
    self.base_url = base_url.into().trim_end_matches('/').to_string();
    self
  }

  /// Use `client` for the token exchange.
  pub fn with_client(mut self, client: reqwest::Client) -> Self {
    self.client = client;
    self
  }

  /// The App ID used as the JWT issuer.
  pub fn app_id(&self) -> &str {
    &self.app_id
  }

  /// The installation tokens are issued for.
  pub fn installation_id(&self) -> &str {
    &self.installation_id
  }

  /// API root the exchange is sent to.
  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  /// Sign the App JWT used to request installation tokens.
  fn app_jwt(&self, now: DateTime<Utc>) -> Result<String, AuthError> {
    let claims = AppClaims {
      iat: now.timestamp() - JWT_BACKDATE_SECS,
      exp: now.timestamp() + JWT_LIFETIME_SECS,
      iss: self.app_id.clone(),
    };
    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
      .map_err(|err| AuthError::InvalidPrivateKey(format!("failed to sign app JWT: {err}")))
  }

  async fn exchange(&self) -> Result<Token, AuthError> {
    let jwt = self.app_jwt(Utc::now())?;
    let url = format!(
      "{}/app/installations/{}/access_tokens",
      self.base_url, self.installation_id
    );

    debug!(installation_id = %self.installation_id, "requesting installation token");

    let response = self
      .client
      .post(&url)
      .bearer_auth(jwt)
      .header(ACCEPT, "application/vnd.github+json")
      .header(USER_AGENT, user_agent())
      .send()
      .await?;

    if !response.status().is_success() {
      let status = response.status();
      let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| String::from("(no error details)"));
      return Err(AuthError::TokenExchange(format!(
        "GitHub API returned error {status}: {error_text}"
      )));
    }

    let body: InstallationTokenResponse = response
      .json()
      .await
      .map_err(|err| AuthError::TokenExchange(format!("invalid response body: {err}")))?;

    let token = Token::bearer(body.token);
    Ok(match body.expires_at {
      Some(expires_at) => token.with_expiry(expires_at),
      None => token,
    })
  }
}

#[async_trait]
impl TokenSource for InstallationTokenSource {
  async fn token(&self) -> Result<Token, AuthError> {
    let mut cached = self.cached.lock().await;

    if let Some(token) = cached.as_ref()
      && token.is_valid_at(Utc::now(), Duration::seconds(REFRESH_LEEWAY_SECS))
    {
      return Ok(token.clone());
    }

    let token = self.exchange().await?;
    debug!(expires_at = ?token.expires_at, "obtained installation token");
    *cached = Some(token.clone());
    Ok(token)
  }
}

impl std::fmt::Debug for InstallationTokenSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("InstallationTokenSource")
      .field("app_id", &self.app_id)
      .field("installation_id", &self.installation_id)
      .field("base_url", &self.base_url)
      .finish_non_exhaustive()
  }
}
