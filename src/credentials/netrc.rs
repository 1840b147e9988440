//! `.netrc` token discovery.
//!
//! Reads a netrc file and returns the `password` of the entry for the GitHub
//! host as a bearer token. Tools such as `git` and `curl` commonly store a
//! personal access token this way:
//!
//! ```text
//! machine github.com
//!   login octocat
//!   password ghp_xxxxxxxxxxxxxxxxxxxx
//! ```
//!
//! GitHub serves its REST API from `api.<host>`, so entries stored under
//! either name are accepted.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::env::{Environment, home_dir, resolve_host};
use super::{AuthError, Token};

/// One `machine` (or `default`) entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Machine {
  /// Host name, or `None` for the `default` entry
  pub name: Option<String>,
  pub login: Option<String>,
  pub password: Option<String>,
  pub account: Option<String>,
}

/// A parsed netrc file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Netrc {
  machines: Vec<Machine>,
  default: Option<Machine>,
}

impl Netrc {
  /// Parse netrc text.
  ///
  /// Words are whitespace separated, so entries may span several lines or
  /// share one. A value may be wrapped in double quotes to hold spaces, with
  /// `\` escaping the next character. Where a keyword is expected, a word
  /// starting with `#` begins a comment that runs to the end of the line;
  /// values are taken verbatim, so `password #tok` is a password. `macdef`
  /// bodies are skipped up to the next blank line.
  ///
  /// # Errors
  /// Returns a message describing the first syntax error.
  pub fn parse(content: &str) -> Result<Self, String> {
    let mut netrc = Self::default();
    let mut current: Option<Machine> = None;
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
      let mut words = Words::new(line);

      while let Some(keyword) = words.next_word()? {
        if keyword.starts_with('#') {
          break;
        }

        match keyword.as_str() {
          "machine" => {
            netrc.finish(current.take());
            let name = words.next_word()?.ok_or("`machine` without a host name")?;
            current = Some(Machine {
              name: Some(name),
              ..Machine::default()
            });
          }
          "default" => {
            netrc.finish(current.take());
            current = Some(Machine::default());
          }
          "login" | "password" | "account" => {
            let value = words
              .next_word()?
              .ok_or_else(|| format!("`{keyword}` without a value"))?;
            let machine = current
              .as_mut()
              .ok_or_else(|| format!("`{keyword}` outside of a machine entry"))?;
            let slot = match keyword.as_str() {
              "login" => &mut machine.login,
              "password" => &mut machine.password,
              _ => &mut machine.account,
            };
            *slot = Some(value);
          }
          "macdef" => {
            for body in lines.by_ref() {
              if body.trim().is_empty() {
                break;
              }
            }
            break;
          }
          // Unknown keywords are ignored
          _ => {}
        }
      }
    }

    netrc.finish(current);
    Ok(netrc)
  }

  fn finish(&mut self, machine: Option<Machine>) {
    match machine {
      Some(machine) if machine.name.is_some() => self.machines.push(machine),
      Some(machine) => self.default = Some(machine),
      None => {}
    }
  }

  /// The first entry for `host`. The `default` entry is never returned here.
  pub fn machine(&self, host: &str) -> Option<&Machine> {
    self
      .machines
      .iter()
      .find(|machine| machine.name.as_deref() == Some(host))
  }

  /// The `default` entry, if present.
  pub fn default_machine(&self) -> Option<&Machine> {
    self.default.as_ref()
  }

  /// Non-empty password stored for `host`.
  fn password(&self, host: &str) -> Option<&str> {
    self
      .machine(host)
      .and_then(|machine| machine.password.as_deref())
      .filter(|password| !password.is_empty())
  }
}

/// Splits one line into words, unquoting `"..."` values.
struct Words<'a> {
  rest: &'a str,
}

impl<'a> Words<'a> {
  fn new(line: &'a str) -> Self {
    Self { rest: line }
  }

  fn next_word(&mut self) -> Result<Option<String>, String> {
    let trimmed = self.rest.trim_start();
    if trimmed.is_empty() {
      self.rest = trimmed;
      return Ok(None);
    }

    let Some(quoted) = trimmed.strip_prefix('"') else {
      let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
      self.rest = &trimmed[end..];
      return Ok(Some(trimmed[..end].to_string()));
    };

    let mut word = String::new();
    let mut chars = quoted.char_indices();
    while let Some((index, c)) = chars.next() {
      match c {
        '"' => {
          self.rest = &quoted[index + 1..];
          return Ok(Some(word));
        }
        '\\' => word.extend(chars.next().map(|(_, escaped)| escaped)),
        _ => word.push(c),
      }
    }
    Err("unterminated quoted value".to_string())
  }
}

/// Read a token from a netrc file.
///
/// # Arguments
/// * `path` - netrc file to read; defaults to `~/.netrc`.
/// * `host` - host to look up; defaults to [`resolve_host`]. When there is
///   no entry for `host`, `api.<host>` is tried as well.
///
/// # Errors
/// Returns an error when the home directory is unknown, the file cannot be
/// read or parsed, or neither entry carries a password.
pub fn netrc_token(env: &dyn Environment, path: Option<&Path>, host: Option<&str>) -> Result<Token, AuthError> {
  let host = host
    .filter(|host| !host.is_empty())
    .map(str::to_string)
    .unwrap_or_else(|| resolve_host(env));
  let path = match path {
    Some(path) => path.to_path_buf(),
    None => default_netrc_path(env)?,
  };

  let content = std::fs::read_to_string(&path).map_err(|source| AuthError::ReadFile {
    path: path.clone(),
    source,
  })?;
  let netrc = Netrc::parse(&content).map_err(|message| AuthError::NetrcParse {
    path: path.clone(),
    message,
  })?;

  let api_host = format!("api.{host}");
  for candidate in [host.as_str(), api_host.as_str()] {
    if let Some(password) = netrc.password(candidate) {
      debug!(path = %path.display(), machine = candidate, "found token in netrc");
      return Ok(Token::bearer(password));
    }
  }

  Err(AuthError::NetrcEntryNotFound { path, host })
}

/// `~/.netrc` for the current user.
pub fn default_netrc_path(env: &dyn Environment) -> Result<PathBuf, AuthError> {
  home_dir(env)
    .map(|home| home.join(".netrc"))
    .ok_or(AuthError::NoHomeDirectory)
}
