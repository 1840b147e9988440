//! Credential sources for the GitHub API.
//!
//! Each submodule turns one kind of credential into a [`Token`] (or, for
//! OAuth Apps, Basic credentials):
//!
//! | Source | Inputs |
//! |--------|--------|
//! | [`static_token_from_environment`] | `GH_TOKEN`, `GITHUB_TOKEN`, `GH_ENTERPRISE_TOKEN`, `GITHUB_ENTERPRISE_TOKEN` |
//! | [`app_installation_token_source`] | `GH_APP_ID`, `GH_APP_INSTALLATION_ID`, `GH_APP_PRIVATE_KEY` |
//! | [`oauth_basic_auth`] | `GH_CLIENT_ID`, `GH_CLIENT_SECRET` |
//! | [`netrc_token`] | `~/.netrc` entry for the host (or `api.<host>`) |
//! | [`cli_token`] | `gh auth token --hostname <host>` (`GH_PATH` or `PATH`) |
//!
//! The host defaults to `github.com` and can be changed with `GH_HOST`.
//! [`crate::transport::Resolver`] tries the sources in the order above.

mod app;
mod env;
mod gh_cli;
mod netrc;
mod oauth;
mod provider;
mod types;

use std::path::PathBuf;

pub use app::{InstallationTokenSource, app_installation_token_source};
pub use env::{
  DEFAULT_HOST, Environment, ProcessEnvironment, TOKEN_VARS, api_base_url, resolve_host, static_token_from_environment,
};
pub use gh_cli::{CommandOutput, CommandRunner, SystemCommandRunner, cli_token};
pub use netrc::{Machine, Netrc, default_netrc_path, netrc_token};
pub use oauth::{BasicAuth, oauth_basic_auth, oauth_basic_auth_transport};
pub use provider::{Credential, StaticTokenSource, TokenSource};
pub use types::{AuthError, Token, TokenType};

/// Explicit values that take priority over the environment.
///
/// Every field is optional; `None` means "use the environment default".
#[derive(Debug, Clone, Default)]
pub struct SourceOverrides {
  /// GitHub host (default: `GH_HOST`, then `github.com`)
  pub host: Option<String>,
  /// REST API root used for the installation token exchange
  pub api_url: Option<String>,
  /// GitHub App ID (default: `GH_APP_ID`)
  pub app_id: Option<String>,
  /// GitHub App installation ID (default: `GH_APP_INSTALLATION_ID`)
  pub installation_id: Option<String>,
  /// Inline PEM or path to the App private key (default: `GH_APP_PRIVATE_KEY`)
  pub private_key: Option<String>,
  /// OAuth App client ID (default: `GH_CLIENT_ID`)
  pub client_id: Option<String>,
  /// OAuth App client secret (default: `GH_CLIENT_SECRET`)
  pub client_secret: Option<String>,
  /// netrc file (default: `~/.netrc`)
  pub netrc_path: Option<PathBuf>,
  /// `gh` executable (default: `GH_PATH`, then `PATH`)
  pub gh_path: Option<PathBuf>,
}
