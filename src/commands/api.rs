//! `gh-auth api <PATH>`: authenticated GET against the REST API.

use url::Url;

use crate::cli::Cli;
use crate::color::ColorScheme;
use crate::commands::{EXIT_NO_CREDENTIALS, fail, run_blocking};

/// Full URL for `path` below `api_url`.
///
/// Absolute `http(s)://` URLs are accepted only when they share the API's
/// origin, since the request carries the resolved credentials.
pub(crate) fn api_endpoint(api_url: &str, path: &str) -> Result<Url, String> {
  let base = Url::parse(api_url.trim_end_matches('/')).map_err(|e| format!("invalid API URL {api_url}: {e}"))?;

  if !(path.starts_with("https://") || path.starts_with("http://")) {
    let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), path.trim_start_matches('/'));
    return Url::parse(&joined).map_err(|e| e.to_string());
  }

  let url = Url::parse(path).map_err(|e| e.to_string())?;
  if url.origin() != base.origin() {
    return Err(format!(
      "{} is not the API origin {}; credentials are only sent to the API host",
      url.origin().ascii_serialization(),
      base.origin().ascii_serialization()
    ));
  }
  Ok(url)
}

/// Pretty-print JSON bodies; anything else is returned as-is.
fn render_body(body: &str) -> String {
  serde_json::from_str::<serde_json::Value>(body)
    .and_then(|value| serde_json::to_string_pretty(&value))
    .unwrap_or_else(|_| body.to_string())
}

/// Send the request, print the status line to stderr and the body to stdout.
pub(crate) async fn handle_api_command(path: &str, cli: &Cli, colors: &ColorScheme) {
  let resolver = cli.resolver();
  let endpoint = api_endpoint(&resolver.api_url(), path)
    .unwrap_or_else(|e| fail(colors, &format!("Invalid API path: {path}"), e, 4)); // Invalid arguments exit code

  let client = cli
    .network
    .http_client()
    .unwrap_or_else(|e| fail(colors, "Failed to create HTTP client", format!("{e:#}"), 1));
  let transport = run_blocking(move || resolver.build_transport(Some(client)))
    .await
    .unwrap_or_else(|e| fail(colors, "Credential lookup failed", format!("{e:#}"), 1))
    .unwrap_or_else(|e| fail(colors, "Cannot authenticate", e, EXIT_NO_CREDENTIALS));

  let response = match transport
    .get(endpoint.clone())
    .header(reqwest::header::ACCEPT, "application/vnd.github+json")
    .send()
    .await
  {
    Ok(response) => response,
    Err(e) => fail(colors, &format!("GET {endpoint} failed"), format!("{e:#}"), 1),
  };

  let status = response.status();
  let body = response
    .text()
    .await
    .unwrap_or_else(|e| fail(colors, "Failed to read response body", e, 1));

  let status_line = format!("{} {}", colors.number(status.as_u16()), status.canonical_reason().unwrap_or(""));
  eprintln!("{} {}", colors.link(&endpoint), status_line.trim_end());
  if !body.is_empty() {
    println!("{}", render_body(&body));
  }

  if !status.is_success() {
    std::process::exit(1);
  }
}
