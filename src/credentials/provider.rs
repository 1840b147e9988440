//! Token source abstractions.
//!
//! Defines the [`TokenSource`] trait so static tokens and GitHub App
//! installation tokens can back the same request middleware, and the
//! [`Credential`] a credential source hands to the resolver.

use std::sync::Arc;

use async_trait::async_trait;

use super::oauth::BasicAuth;
use super::{AuthError, Token};

/// Produces a currently valid token on demand.
///
/// Implementations may refresh transparently; callers should ask for a token
/// per request instead of holding on to one.
#[async_trait]
pub trait TokenSource: Send + Sync {
  /// Return a token that is valid right now.
  ///
  /// # Errors
  /// Returns `Err(AuthError)` when a fresh token cannot be obtained (for
  /// example, a failed installation token exchange).
  async fn token(&self) -> Result<Token, AuthError>;
}

/// A [`TokenSource`] that always returns the same token.
#[derive(Debug, Clone)]
pub struct StaticTokenSource {
  token: Token,
}

impl StaticTokenSource {
  /// Wrap a fixed token.
  pub fn new(token: Token) -> Self {
    Self { token }
  }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
  async fn token(&self) -> Result<Token, AuthError> {
    Ok(self.token.clone())
  }
}

/// What a credential source produced.
#[derive(Clone)]
pub enum Credential {
  /// Requests are authorized with a (possibly refreshing) bearer token
  Token(Arc<dyn TokenSource>),
  /// Requests are authorized with HTTP Basic auth (OAuth App client credentials)
  Basic(BasicAuth),
}

impl Credential {
  /// Credential backed by a fixed token.
  pub fn from_token(token: Token) -> Self {
    Self::Token(Arc::new(StaticTokenSource::new(token)))
  }
}

impl std::fmt::Debug for Credential {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Token(_) => f.write_str("Credential::Token(..)"),
      Self::Basic(basic) => f.debug_tuple("Credential::Basic").field(basic).finish(),
    }
  }
}
