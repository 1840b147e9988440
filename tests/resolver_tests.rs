//! Resolution order and failure aggregation across all credential sources.

mod common;

use common::{app_private_key_path, env, isolated_overrides, isolated_resolver};
use gh_auth::Resolver;
use gh_auth::credentials::{AuthError, Credential, SourceOverrides, Token};
use gh_auth::transport::{CredentialSource, default_client};

async fn bearer(credential: Credential) -> Token {
  match credential {
    Credential::Token(source) => source.token().await.unwrap(),
    Credential::Basic(basic) => panic!("expected a token credential, got Basic for {}", basic.username),
  }
}

#[tokio::test]
async fn test_environment_token_beats_app_credentials() {
  let key = app_private_key_path();
  let resolver = isolated_resolver(&[
    ("GH_TOKEN", "ghp_from_env"),
    ("GH_APP_ID", "123"),
    ("GH_APP_INSTALLATION_ID", "456"),
    ("GH_APP_PRIVATE_KEY", key.to_str().unwrap()),
  ]);

  let resolved = resolver.resolve(&default_client()).unwrap();
  assert_eq!(resolved.source, CredentialSource::Environment);
  assert_eq!(bearer(resolved.credential).await, Token::bearer("ghp_from_env"));
}

#[test]
fn test_app_credentials_beat_oauth() {
  let key = app_private_key_path();
  let resolver = isolated_resolver(&[
    ("GH_APP_ID", "123"),
    ("GH_APP_INSTALLATION_ID", "456"),
    ("GH_APP_PRIVATE_KEY", key.to_str().unwrap()),
    ("GH_CLIENT_ID", "Iv1.client"),
    ("GH_CLIENT_SECRET", "secret"),
  ]);

  let resolved = resolver.resolve(&default_client()).unwrap();
  assert_eq!(resolved.source, CredentialSource::App);
}

#[test]
fn test_every_failure_is_reported_in_order() {
  let resolver = isolated_resolver(&[]);

  let err = resolver.resolve(&default_client()).unwrap_err();
  let sources: Vec<_> = err.failures().iter().map(|(source, _)| *source).collect();
  assert_eq!(sources, CredentialSource::ORDER);

  let failures = err.failures();
  assert!(matches!(failures[0].1, AuthError::NoEnvironmentToken));
  assert!(matches!(failures[1].1, AuthError::NotSet("GH_APP_ID")));
  assert!(matches!(failures[2].1, AuthError::NotSet("GH_CLIENT_ID")));
  assert!(matches!(failures[3].1, AuthError::ReadFile { .. }));
  assert!(matches!(failures[4].1, AuthError::CliNotFound(_)));

  let message = err.to_string();
  assert!(message.starts_with("no GitHub credentials found\n"));
  assert_eq!(message.lines().count(), 6);
  assert!(message.contains("\n  environment: no token found in environment variables"));
  assert!(message.contains("\n  gh cli: gh CLI not found in PATH"));
}

#[test]
fn test_build_transport_fails_without_credentials() {
  let resolver = isolated_resolver(&[("GH_CLIENT_ID", "Iv1.only-half")]);
  let err = resolver.build_transport(None).unwrap_err();
  assert!(err.to_string().contains("oauth app: GH_CLIENT_SECRET is not set"));
}

#[tokio::test]
async fn test_netrc_entry_for_api_host_is_used() {
  let dir = tempfile::tempdir().unwrap();
  let netrc = dir.path().join(".netrc");
  std::fs::write(
    &netrc,
    "# personal access token\nmachine api.github.com\n  login octocat\n  password gho_netrc\n",
  )
  .unwrap();

  let resolver = Resolver::new()
    .with_environment(env(&[]))
    .with_overrides(SourceOverrides {
      netrc_path: Some(netrc),
      ..SourceOverrides::default()
    });

  let resolved = resolver.resolve(&default_client()).unwrap();
  assert_eq!(resolved.source, CredentialSource::Netrc);
  assert_eq!(bearer(resolved.credential).await, Token::bearer("gho_netrc"));
}

#[tokio::test]
async fn test_netrc_honors_gh_host() {
  let dir = tempfile::tempdir().unwrap();
  let netrc = dir.path().join(".netrc");
  std::fs::write(
    &netrc,
    "machine github.com login a password public\nmachine ghe.corp login b password enterprise\n",
  )
  .unwrap();

  let resolver = Resolver::new()
    .with_environment(env(&[("GH_HOST", "ghe.corp")]))
    .with_overrides(SourceOverrides {
      netrc_path: Some(netrc),
      ..SourceOverrides::default()
    });

  let resolved = resolver.resolve(&default_client()).unwrap();
  assert_eq!(bearer(resolved.credential).await, Token::bearer("enterprise"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_gh_cli_is_the_last_resort() {
  let dir = tempfile::tempdir().unwrap();
  common::write_gh_stub(dir.path(), "tok123\\n");

  let resolver = isolated_resolver(&[("PATH", dir.path().to_str().unwrap())]);
  let resolved = resolver.resolve(&default_client()).unwrap();
  assert_eq!(resolved.source, CredentialSource::Cli);
  assert_eq!(bearer(resolved.credential).await, Token::bearer("tok123"));

  let args = std::fs::read_to_string(dir.path().join("args")).unwrap();
  assert_eq!(args.trim(), "auth token --hostname github.com");
}

#[cfg(unix)]
#[test]
fn test_gh_cli_failure_is_reported() {
  let dir = tempfile::tempdir().unwrap();
  let gh = common::write_gh_stub(dir.path(), "");

  let resolver = Resolver::new()
    .with_environment(env(&[("GH_HOST", "ghe.corp")]))
    .with_overrides(SourceOverrides {
      gh_path: Some(gh),
      ..isolated_overrides()
    });

  let err = resolver.attempt(CredentialSource::Cli, &default_client()).unwrap_err();
  assert!(matches!(err, AuthError::EmptyCliToken { .. }));
  assert!(err.to_string().ends_with("auth token --hostname ghe.corp returned empty token"));
}
