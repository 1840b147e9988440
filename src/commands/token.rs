//! `gh-auth token`: print the bearer token requests would carry.

use crate::cli::Cli;
use crate::color::ColorScheme;
use crate::commands::{EXIT_NO_CREDENTIALS, fail, run_blocking};
use crate::credentials::Credential;
use crate::transport::CredentialSource;

/// Resolve credentials (optionally from a single `source`) and print the
/// token on stdout.
///
/// GitHub App credentials are exchanged for an installation token first.
/// OAuth App credentials authenticate with Basic auth and have no token to
/// print, so they are reported as an error.
pub(crate) async fn handle_token_command(source: Option<CredentialSource>, cli: &Cli, colors: &ColorScheme) {
  let client = cli
    .network
    .http_client()
    .unwrap_or_else(|e| fail(colors, "Failed to create HTTP client", format!("{e:#}"), 1));
  let resolver = cli.resolver();

  let (source, credential) = match source {
    Some(source) => {
      let attempt = run_blocking(move || resolver.attempt(source, &client))
        .await
        .unwrap_or_else(|e| fail(colors, "Credential lookup failed", format!("{e:#}"), 1));
      match attempt {
        Ok(credential) => (source, credential),
        Err(e) => fail(
          colors,
          &format!("No credentials from {source}"),
          e,
          EXIT_NO_CREDENTIALS,
        ),
      }
    }
    None => {
      let resolved = run_blocking(move || resolver.resolve(&client))
        .await
        .unwrap_or_else(|e| fail(colors, "Credential lookup failed", format!("{e:#}"), 1));
      match resolved {
        Ok(resolved) => (resolved.source, resolved.credential),
        Err(e) => fail(colors, "No GitHub credentials found", render_failures(&e), EXIT_NO_CREDENTIALS),
      }
    }
  };

  let token_source = match credential {
    Credential::Token(token_source) => token_source,
    Credential::Basic(basic) => fail(
      colors,
      &format!("The {source} source has no bearer token"),
      format!("requests authenticate with Basic auth as client {}", basic.username),
      1,
    ),
  };

  match token_source.token().await {
    Ok(token) => println!("{}", token.access_token),
    Err(e) => fail(colors, &format!("Failed to obtain a token from {source}"), e, 1),
  }
}

/// One `<source>: <reason>` line per rejected source.
fn render_failures(err: &crate::transport::ResolveError) -> String {
  err
    .failures()
    .iter()
    .map(|(source, reason)| format!("{source}: {reason}"))
    .collect::<Vec<_>>()
    .join("\n")
}
