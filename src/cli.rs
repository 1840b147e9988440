//! Command-line interface definitions for gh-auth.
//!
//! Defines the CLI with clap derives, turns credential flags into
//! [`SourceOverrides`], and dispatches to the handlers in [`crate::commands`].

use std::path::PathBuf;
use std::process;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use url::Url;

use crate::color::ColorScheme;
use crate::commands::api::handle_api_command;
use crate::commands::completions::handle_completions_command;
use crate::commands::status::handle_status_command;
use crate::commands::token::handle_token_command;
use crate::commands::version::handle_version_command;
use crate::credentials::SourceOverrides;
use crate::transport::{CredentialSource, Resolver, user_agent};

/// gh-auth - Resolve GitHub API credentials
#[derive(Debug, Parser)]
#[command(
  name = "gh-auth",
  version,
  about = "Resolve GitHub API credentials",
  long_about = "Finds credentials for the GitHub REST API by trying, in order: GH_TOKEN-style environment\n\
                variables, a GitHub App installation, an OAuth App, ~/.netrc, and the gh CLI.",
  styles = get_clap_styles()
)]
pub struct Cli {
  /// Subcommand to execute
  #[command(subcommand)]
  pub command: Command,

  /// Credential source options
  #[command(flatten)]
  pub credentials: CredentialOptions,

  /// Behavior options
  #[command(flatten)]
  pub behavior: BehaviorOptions,

  /// Network options
  #[command(flatten)]
  pub network: NetworkOptions,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
  /// Print the bearer token the resolver would use
  Token {
    /// Only consult this source instead of the whole chain
    #[arg(long, value_enum)]
    source: Option<CredentialSource>,
  },

  /// Show which credential sources are available and which one wins
  Status,

  /// Send an authenticated GET request to the REST API
  Api {
    /// API path (e.g. `user` or `/repos/OWNER/REPO`) or absolute URL
    #[arg(value_name = "PATH")]
    path: String,
  },

  /// Display version and build information
  Version {
    /// Output in JSON format
    #[arg(long)]
    json: bool,

    /// Show only version number
    #[arg(long)]
    short: bool,
  },

  /// Generate shell completion scripts
  Completions {
    /// Target shell for completions
    #[arg(value_enum)]
    shell: Shell,
  },
}

/// Accept either a bare host (`ghe.example.com`) or a URL and keep the host
/// (and port, if any).
fn normalize_host(input: &str) -> Result<String, String> {
  let trimmed = input.trim();

  let parsed = match Url::parse(trimmed) {
    Ok(parsed) if parsed.has_host() => parsed,
    _ => Url::parse(&format!("https://{trimmed}")).map_err(|e| format!("Invalid host: {e}"))?,
  };

  let host = parsed.host_str().ok_or_else(|| format!("Invalid host: {trimmed}"))?;
  Ok(match parsed.port() {
    Some(port) => format!("{host}:{port}"),
    None => host.to_string(),
  })
}

/// Credential source options. Each falls back to its environment variable.
#[derive(Debug, Parser)]
pub struct CredentialOptions {
  /// GitHub host
  #[arg(long, env = "GH_HOST", value_name = "HOST", value_parser = normalize_host)]
  pub host: Option<String>,

  /// REST API root for the App token exchange (default: derived from --host)
  #[arg(long, value_name = "URL")]
  pub api_url: Option<Url>,

  /// GitHub App ID [fallback: GH_APP_ID]
  #[arg(long, value_name = "ID")]
  pub app_id: Option<String>,

  /// GitHub App installation ID [fallback: GH_APP_INSTALLATION_ID]
  #[arg(long, value_name = "ID")]
  pub installation_id: Option<String>,

  /// GitHub App private key, inline PEM or file path [fallback: GH_APP_PRIVATE_KEY]
  #[arg(long, value_name = "PEM_OR_PATH")]
  pub private_key: Option<String>,

  /// OAuth App client ID [fallback: GH_CLIENT_ID]
  #[arg(long, value_name = "ID")]
  pub client_id: Option<String>,

  /// OAuth App client secret [fallback: GH_CLIENT_SECRET]
  #[arg(long, value_name = "SECRET")]
  pub client_secret: Option<String>,

  /// netrc file [default: ~/.netrc]
  #[arg(long, value_name = "FILE")]
  pub netrc: Option<PathBuf>,

  /// gh executable [fallback: GH_PATH, then PATH]
  #[arg(long, value_name = "FILE")]
  pub gh_path: Option<PathBuf>,
}

impl CredentialOptions {
  /// Explicit values for the resolver.
  pub fn to_overrides(&self) -> SourceOverrides {
    SourceOverrides {
      host: self.host.clone(),
      api_url: self.api_url.as_ref().map(|url| url.as_str().trim_end_matches('/').to_string()),
      app_id: self.app_id.clone(),
      installation_id: self.installation_id.clone(),
      private_key: self.private_key.clone(),
      client_id: self.client_id.clone(),
      client_secret: self.client_secret.clone(),
      netrc_path: self.netrc.clone(),
      gh_path: self.gh_path.clone(),
    }
  }
}

/// Behavior options
#[derive(Debug, Parser)]
pub struct BehaviorOptions {
  /// Increase verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, global = true, action = clap::ArgAction::Count)]
  pub verbose: u8,

  /// Suppress all output except errors
  #[arg(short, long, global = true, conflicts_with = "verbose")]
  pub quiet: bool,

  /// Colorize output
  #[arg(long, global = true, value_enum, default_value = "auto", value_name = "WHEN")]
  pub color: ColorOption,
}

/// Color output options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorOption {
  Auto,
  Always,
  Never,
}

/// Shells supported by `gh-auth completions`
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
  Bash,
  Zsh,
  Fish,
  Powershell,
  Elvish,
}

/// Network options
#[derive(Debug, Parser)]
pub struct NetworkOptions {
  /// Request timeout in seconds
  #[arg(long, default_value = "30", value_name = "SECONDS")]
  pub timeout: u64,
}

impl NetworkOptions {
  /// Base HTTP client for API requests and the App token exchange.
  pub fn http_client(&self) -> Result<reqwest::Client> {
    reqwest::Client::builder()
      .timeout(Duration::from_secs(self.timeout))
      .user_agent(user_agent())
      .build()
      .context("Failed to create HTTP client")
  }
}

impl Cli {
  /// Parse CLI arguments from the environment
  pub fn parse_args() -> Self {
    Self::parse()
  }

  /// Validate CLI arguments
  pub fn validate(&self) -> Result<(), String> {
    if self.network.timeout == 0 {
      return Err("--timeout must be at least 1 second".to_string());
    }

    if let Command::Version { json: true, short: true } = self.command {
      return Err("--json and --short cannot be combined".to_string());
    }

    Ok(())
  }

  /// Resolver honoring the credential flags.
  pub fn resolver(&self) -> Resolver {
    Resolver::new().with_overrides(self.credentials.to_overrides())
  }
}

/// Parse CLI arguments, initialize logging, and dispatch to the chosen
/// command.
pub async fn run() {
  let cli = Cli::parse_args();

  init_tracing(&cli.behavior);

  let colors = ColorScheme::new(cli.behavior.color);

  if let Err(e) = cli.validate() {
    eprintln!("{} {}", colors.error("Error:"), e);
    process::exit(4); // Invalid arguments exit code
  }

  match &cli.command {
    Command::Token { source } => handle_token_command(*source, &cli, &colors).await,
    Command::Status => handle_status_command(&cli, &colors).await,
    Command::Api { path } => handle_api_command(path, &cli, &colors).await,
    Command::Version { json, short } => handle_version_command(*json, *short, &colors),
    Command::Completions { shell } => handle_completions_command(*shell),
  }
}

fn init_tracing(behavior: &BehaviorOptions) {
  let level = if behavior.quiet {
    LevelFilter::ERROR
  } else {
    match behavior.verbose {
      0 => LevelFilter::WARN,
      1 => LevelFilter::INFO,
      2 => LevelFilter::DEBUG,
      _ => LevelFilter::TRACE,
    }
  };

  let env_filter = EnvFilter::builder()
    .with_default_directive(level.into())
    .from_env_lossy();

  let _ = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .try_init();
}

/// Get custom styles for clap help output
fn get_clap_styles() -> clap::builder::Styles {
  use clap::builder::styling::{AnsiColor, Effects};

  clap::builder::Styles::styled()
    .header(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
    .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
    .literal(AnsiColor::BrightGreen.on_default())
    .placeholder(AnsiColor::BrightCyan.on_default())
    .error(AnsiColor::BrightRed.on_default() | Effects::BOLD)
    .valid(AnsiColor::BrightGreen.on_default())
    .invalid(AnsiColor::BrightRed.on_default())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_normalize_host() {
    assert_eq!(normalize_host("github.com").unwrap(), "github.com");
    assert_eq!(normalize_host(" ghe.example.com ").unwrap(), "ghe.example.com");
    assert_eq!(normalize_host("https://ghe.example.com/").unwrap(), "ghe.example.com");
    assert_eq!(normalize_host("http://localhost:8080/api/v3").unwrap(), "localhost:8080");
    assert!(normalize_host("exa mple.com").is_err());
  }

  #[test]
  fn test_parse_token_with_source() {
    let cli = Cli::try_parse_from(["gh-auth", "token", "--source", "netrc"]).unwrap();
    assert!(matches!(
      cli.command,
      Command::Token {
        source: Some(CredentialSource::Netrc)
      }
    ));
  }

  #[test]
  fn test_parse_source_names() {
    for (name, expected) in [
      ("env", CredentialSource::Environment),
      ("environment", CredentialSource::Environment),
      ("app", CredentialSource::App),
      ("oauth", CredentialSource::OAuth),
      ("cli", CredentialSource::Cli),
    ] {
      let cli = Cli::try_parse_from(["gh-auth", "token", "--source", name]).unwrap();
      assert!(matches!(cli.command, Command::Token { source: Some(s) } if s == expected), "{name}");
    }
  }

  #[test]
  fn test_credential_flags_become_overrides() {
    let cli = Cli::try_parse_from([
      "gh-auth",
      "--app-id",
      "123",
      "--installation-id",
      "456",
      "--private-key",
      "/keys/app.pem",
      "--api-url",
      "https://ghe.corp/api/v3/",
      "--netrc",
      "/tmp/netrc",
      "status",
    ])
    .unwrap();

    let overrides = cli.credentials.to_overrides();
    assert_eq!(overrides.app_id.as_deref(), Some("123"));
    assert_eq!(overrides.installation_id.as_deref(), Some("456"));
    assert_eq!(overrides.private_key.as_deref(), Some("/keys/app.pem"));
    assert_eq!(overrides.api_url.as_deref(), Some("https://ghe.corp/api/v3"));
    assert_eq!(overrides.netrc_path, Some(PathBuf::from("/tmp/netrc")));
    assert!(overrides.client_id.is_none());
  }

  #[test]
  fn test_global_verbosity_after_subcommand() {
    let cli = Cli::try_parse_from(["gh-auth", "status", "-vv"]).unwrap();
    assert_eq!(cli.behavior.verbose, 2);
  }

  #[test]
  fn test_validate_timeout() {
    let cli = Cli::try_parse_from(["gh-auth", "--timeout", "0", "status"]).unwrap();
    assert!(cli.validate().unwrap_err().contains("--timeout"));
  }

  #[test]
  fn test_validate_version_flags() {
    let cli = Cli::try_parse_from(["gh-auth", "version", "--json", "--short"]).unwrap();
    assert!(cli.validate().is_err());

    let cli = Cli::try_parse_from(["gh-auth", "version", "--json"]).unwrap();
    assert!(cli.validate().is_ok());
  }

  #[test]
  fn test_parse_completions() {
    let cli = Cli::try_parse_from(["gh-auth", "completions", "zsh"]).unwrap();
    assert!(matches!(cli.command, Command::Completions { shell: Shell::Zsh }));
  }
}
