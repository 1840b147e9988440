//! `gh-auth status`: report every credential source.

use anyhow::Result;

use crate::cli::Cli;
use crate::color::ColorScheme;
use crate::commands::{EXIT_NO_CREDENTIALS, fail, run_blocking};
use crate::credentials::Credential;
use crate::transport::{CredentialSource, Resolver};

/// What one source offered, rendered for humans.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct SourceReport {
  pub source: CredentialSource,
  pub outcome: Result<String, String>,
}

/// Attempt every source in resolution order without stopping at the first
/// success.
///
/// Static tokens are shown masked. GitHub App credentials are not exchanged;
/// only their presence is reported.
pub(crate) async fn collect_reports(resolver: Resolver, client: reqwest::Client) -> Result<Vec<SourceReport>> {
  let attempts =
    run_blocking(move || CredentialSource::ORDER.map(|source| (source, resolver.attempt(source, &client)))).await?;

  let mut reports = Vec::with_capacity(attempts.len());
  for (source, attempt) in attempts {
    let outcome = match attempt {
      Err(e) => Err(e.to_string()),
      Ok(Credential::Basic(basic)) => Ok(format!("client {} (Basic auth)", basic.username)),
      Ok(Credential::Token(_)) if source == CredentialSource::App => {
        Ok("installation token (exchanged on first request)".to_string())
      }
      Ok(Credential::Token(token_source)) => token_source
        .token()
        .await
        .map(|token| format!("token {}", token.masked()))
        .map_err(|e| e.to_string()),
    };
    reports.push(SourceReport { source, outcome });
  }

  Ok(reports)
}

/// Print which sources are usable and which one wins.
pub(crate) async fn handle_status_command(cli: &Cli, colors: &ColorScheme) {
  let client = cli
    .network
    .http_client()
    .unwrap_or_else(|e| fail(colors, "Failed to create HTTP client", format!("{e:#}"), 1));
  let resolver = cli.resolver();

  println!("{} {}", colors.info("→"), colors.info("Credential sources"));
  println!("  {}: {}", colors.emphasis("Host"), resolver.host());
  println!("  {}: {}", colors.emphasis("API"), colors.link(resolver.api_url()));
  println!();

  let reports = collect_reports(resolver, client)
    .await
    .unwrap_or_else(|e| fail(colors, "Credential lookup failed", format!("{e:#}"), 1));
  for report in &reports {
    match &report.outcome {
      Ok(detail) => println!("{} {}: {}", colors.success("✓"), colors.emphasis(report.source), detail),
      Err(reason) => println!(
        "{} {}: {}",
        colors.error("✗"),
        colors.emphasis(report.source),
        colors.dimmed(reason)
      ),
    }
  }

  match reports.iter().find(|report| report.outcome.is_ok()) {
    Some(winner) => println!(
      "\n{} Requests will use {}",
      colors.info("ℹ"),
      colors.code(winner.source)
    ),
    None => fail(
      colors,
      "No GitHub credentials found",
      "set GH_TOKEN, configure a GitHub App or OAuth App, add a .netrc entry, or run `gh auth login`",
      EXIT_NO_CREDENTIALS,
    ),
  }
}
