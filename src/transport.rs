//! Authenticated HTTP transport for the GitHub API.
//!
//! [`Resolver`] tries every credential source in a fixed order and wraps the
//! first one that succeeds around a `reqwest::Client`:
//!
//! 1. static token from the environment
//! 2. GitHub App installation token
//! 3. OAuth App client credentials (Basic auth)
//! 4. `.netrc`
//! 5. `gh auth token`
//!
//! Cheap, predictable sources come first; file and subprocess lookups last.
//! When every source fails, [`ResolveError`] keeps all five reasons.

use std::fmt;
use std::sync::Arc;

use clap::ValueEnum;
use http::Extensions;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Request, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};
use tracing::{debug, info};

use crate::credentials::{
  AuthError, CommandRunner, Credential, Environment, ProcessEnvironment, SourceOverrides, SystemCommandRunner,
  TokenSource, api_base_url, app_installation_token_source, cli_token, netrc_token, oauth_basic_auth,
  resolve_host, static_token_from_environment,
};

/// An HTTP client whose requests carry GitHub credentials.
pub type Transport = ClientWithMiddleware;

/// `User-Agent` sent with every request; GitHub rejects requests without one.
pub fn user_agent() -> String {
  format!("gh-auth/{} ({})", env!("CARGO_PKG_VERSION"), env!("TARGET"))
}

/// The client used when the caller does not supply one.
pub fn default_client() -> reqwest::Client {
  reqwest::Client::builder()
    .user_agent(user_agent())
    .build()
    .unwrap_or_default()
}

/// Request middleware adding `Authorization: <type> <token>` from a
/// [`TokenSource`].
#[derive(Clone)]
pub struct TokenAuth {
  source: Arc<dyn TokenSource>,
}

impl TokenAuth {
  /// Authorize requests with tokens from `source`.
  pub fn new(source: Arc<dyn TokenSource>) -> Self {
    Self { source }
  }
}

#[async_trait::async_trait]
impl Middleware for TokenAuth {
  async fn handle(
    &self,
    mut req: Request,
    extensions: &mut Extensions,
    next: Next<'_>,
  ) -> reqwest_middleware::Result<Response> {
    let token = self
      .source
      .token()
      .await
      .map_err(reqwest_middleware::Error::middleware)?;
    let mut value = HeaderValue::from_str(&token.authorization()).map_err(reqwest_middleware::Error::middleware)?;
    value.set_sensitive(true);
    req.headers_mut().insert(AUTHORIZATION, value);
    next.run(req, extensions).await
  }
}

impl Credential {
  /// Wrap `base` so every request is authorized with this credential.
  pub fn into_transport(self, base: reqwest::Client) -> Transport {
    let builder = ClientBuilder::new(base);
    match self {
      Self::Token(source) => builder.with(TokenAuth::new(source)).build(),
      Self::Basic(basic) => builder.with(basic).build(),
    }
  }
}

/// The credential sources, in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum CredentialSource {
  /// `GH_TOKEN` and friends
  #[value(name = "env", alias = "environment")]
  Environment,
  /// GitHub App installation token
  App,
  /// OAuth App client ID and secret
  #[value(name = "oauth")]
  OAuth,
  /// `.netrc` entry
  Netrc,
  /// `gh auth token`
  Cli,
}

impl CredentialSource {
  /// Every source, highest priority first.
  pub const ORDER: [Self; 5] = [Self::Environment, Self::App, Self::OAuth, Self::Netrc, Self::Cli];

  /// Short name used in messages.
  pub fn name(self) -> &'static str {
    match self {
      Self::Environment => "environment",
      Self::App => "github app",
      Self::OAuth => "oauth app",
      Self::Netrc => "netrc",
      Self::Cli => "gh cli",
    }
  }
}

impl fmt::Display for CredentialSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// The winning source and what it produced.
#[derive(Debug, Clone)]
pub struct Resolved {
  pub source: CredentialSource,
  pub credential: Credential,
}

/// Every credential source failed.
#[derive(Debug)]
pub struct ResolveError {
  failures: Vec<(CredentialSource, AuthError)>,
}

impl ResolveError {
  /// Build from per-source failures, in the order they were attempted.
  pub fn new(failures: Vec<(CredentialSource, AuthError)>) -> Self {
    Self { failures }
  }

  /// Why each source was rejected.
  pub fn failures(&self) -> &[(CredentialSource, AuthError)] {
    &self.failures
  }
}

impl fmt::Display for ResolveError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "no GitHub credentials found")?;
    for (source, err) in &self.failures {
      write!(f, "\n  {source}: {err}")?;
    }
    Ok(())
  }
}

impl std::error::Error for ResolveError {}

/// Tries each credential source in [`CredentialSource::ORDER`].
pub struct Resolver {
  env: Box<dyn Environment>,
  runner: Box<dyn CommandRunner>,
  overrides: SourceOverrides,
}

impl Default for Resolver {
  fn default() -> Self {
    Self {
      env: Box::new(ProcessEnvironment),
      runner: Box::new(SystemCommandRunner),
      overrides: SourceOverrides::default(),
    }
  }
}

impl Resolver {
  /// Resolver reading the process environment and running the real `gh`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Read variables from `env` instead of the process environment.
  pub fn with_environment(mut self, env: impl Environment + 'static) -> Self {
    self.env = Box::new(env);
    self
  }

  /// Run `gh` through `runner`.
  pub fn with_command_runner(mut self, runner: impl CommandRunner + 'static) -> Self {
    self.runner = Box::new(runner);
    self
  }

  /// Prefer these values over the environment.
  pub fn with_overrides(mut self, overrides: SourceOverrides) -> Self {
    self.overrides = overrides;
    self
  }

  /// Host the credentials are resolved for.
  pub fn host(&self) -> String {
    self
      .overrides
      .host
      .clone()
      .filter(|host| !host.is_empty())
      .unwrap_or_else(|| resolve_host(self.env.as_ref()))
  }

  /// REST API root for [`Resolver::host`].
  pub fn api_url(&self) -> String {
    self
      .overrides
      .api_url
      .as_deref()
      .map(|url| url.trim_end_matches('/').to_string())
      .unwrap_or_else(|| api_base_url(&self.host()))
  }

  /// Try a single source.
  ///
  /// `base` is used for the GitHub App token exchange.
  ///
  /// # Errors
  /// Returns why `source` could not provide a credential.
  pub fn attempt(&self, source: CredentialSource, base: &reqwest::Client) -> Result<Credential, AuthError> {
    let env = self.env.as_ref();
    let overrides = &self.overrides;
    let host = overrides.host.as_deref();

    match source {
      CredentialSource::Environment => static_token_from_environment(env).map(Credential::from_token),
      CredentialSource::App => {
        let token_source = app_installation_token_source(
          env,
          overrides.app_id.as_deref(),
          overrides.installation_id.as_deref(),
          overrides.private_key.as_deref(),
        )?;
        let token_source = if overrides.api_url.is_some() || host.is_some() {
          token_source.with_base_url(self.api_url())
        } else {
          token_source
        };
        Ok(Credential::Token(Arc::new(token_source.with_client(base.clone()))))
      }
      CredentialSource::OAuth => {
        let basic = oauth_basic_auth(env, overrides.client_id.as_deref(), overrides.client_secret.as_deref())?;
        Ok(Credential::Basic(basic))
      }
      CredentialSource::Netrc => netrc_token(env, overrides.netrc_path.as_deref(), host).map(Credential::from_token),
      CredentialSource::Cli => {
        cli_token(env, self.runner.as_ref(), overrides.gh_path.as_deref(), host).map(Credential::from_token)
      }
    }
  }

  /// Return the first source that yields a credential.
  ///
  /// Later sources are not attempted once one succeeds.
  ///
  /// # Errors
  /// Returns [`ResolveError`] with every source's failure when none succeed.
  pub fn resolve(&self, base: &reqwest::Client) -> Result<Resolved, ResolveError> {
    let mut failures = Vec::with_capacity(CredentialSource::ORDER.len());

    for source in CredentialSource::ORDER {
      match self.attempt(source, base) {
        Ok(credential) => {
          info!(source = %source, "using GitHub credentials");
          return Ok(Resolved { source, credential });
        }
        Err(err) => {
          debug!(source = %source, error = %err, "credential source unavailable");
          failures.push((source, err));
        }
      }
    }

    Err(ResolveError::new(failures))
  }

  /// Resolve credentials and wrap them around `base` (or the default client).
  ///
  /// # Errors
  /// Returns [`ResolveError`] when no source yields a credential.
  pub fn build_transport(&self, base: Option<reqwest::Client>) -> Result<Transport, ResolveError> {
    let base = base.unwrap_or_else(default_client);
    let resolved = self.resolve(&base)?;
    Ok(resolved.credential.into_transport(base))
  }
}

/// Build an authenticated transport from the process environment.
///
/// # Errors
/// Returns [`ResolveError`] when no source yields a credential.
pub fn build_transport(base: Option<reqwest::Client>) -> Result<Transport, ResolveError> {
  Resolver::new().build_transport(base)
}
