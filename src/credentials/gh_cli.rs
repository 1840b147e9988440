//! Tokens managed by the GitHub CLI.
//!
//! Runs `gh auth token --hostname <host>` and uses whatever the CLI prints.
//! This is the only credential source with a side effect, so process
//! execution goes through [`CommandRunner`] and can be faked in tests.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use super::env::{Environment, resolve_host};
use super::{AuthError, Token};

#[cfg(windows)]
const GH_EXECUTABLE: &str = "gh.exe";
#[cfg(not(windows))]
const GH_EXECUTABLE: &str = "gh";

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
  /// Exit code, `None` when the process was killed by a signal
  pub code: Option<i32>,
  pub stdout: Vec<u8>,
  pub stderr: Vec<u8>,
}

impl CommandOutput {
  /// Whether the process exited with status zero.
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }
}

/// Runs an executable to completion and captures its output.
pub trait CommandRunner: Send + Sync {
  /// Run `program` with `args`.
  ///
  /// # Errors
  /// Returns the I/O error when the process cannot be spawned.
  fn run(&self, program: &Path, args: &[&str]) -> std::io::Result<CommandOutput>;
}

/// [`CommandRunner`] backed by [`std::process::Command`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
  fn run(&self, program: &Path, args: &[&str]) -> std::io::Result<CommandOutput> {
    let output = Command::new(program).args(args).output()?;
    Ok(CommandOutput {
      code: output.status.code(),
      stdout: output.stdout,
      stderr: output.stderr,
    })
  }
}

/// Obtain the token the GitHub CLI is logged in with.
///
/// # Arguments
/// * `path` - `gh` executable; falls back to `GH_PATH`, then a `PATH` search.
/// * `host` - host passed to `--hostname`; defaults to [`resolve_host`].
///
/// # Errors
/// Returns an error when `gh` cannot be found or started, exits
/// unsuccessfully, or prints nothing.
pub fn cli_token(
  env: &dyn Environment,
  runner: &dyn CommandRunner,
  path: Option<&Path>,
  host: Option<&str>,
) -> Result<Token, AuthError> {
  let host = host
    .filter(|host| !host.is_empty())
    .map(str::to_string)
    .unwrap_or_else(|| resolve_host(env));
  let program = match path {
    Some(path) => path.to_path_buf(),
    None => locate_gh(env)?,
  };

  let args = ["auth", "token", "--hostname", host.as_str()];
  let command = format!("{} {}", program.display(), args.join(" "));
  debug!(command = %command, "asking gh CLI for a token");

  let output = runner.run(&program, &args).map_err(|err| AuthError::CommandFailed {
    command: command.clone(),
    message: err.to_string(),
  })?;

  if !output.success() {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let status = output
      .code
      .map_or_else(|| "terminated by signal".to_string(), |code| format!("exit status {code}"));
    let message = if stderr.is_empty() {
      status
    } else {
      format!("{status}: {stderr}")
    };
    return Err(AuthError::CommandFailed { command, message });
  }

  let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
  if token.is_empty() {
    return Err(AuthError::EmptyCliToken { command });
  }

  Ok(Token::bearer(token))
}

/// Find `gh` via `GH_PATH`, then the directories listed in `PATH`.
fn locate_gh(env: &dyn Environment) -> Result<PathBuf, AuthError> {
  if let Some(path) = env.non_empty("GH_PATH") {
    return Ok(PathBuf::from(path));
  }

  let search_path = env
    .non_empty("PATH")
    .ok_or_else(|| AuthError::CliNotFound("PATH is not set".to_string()))?;

  std::env::split_paths(&search_path)
    .map(|dir| dir.join(GH_EXECUTABLE))
    .find(|candidate| is_executable(candidate))
    .ok_or_else(|| AuthError::CliNotFound(format!("no `{GH_EXECUTABLE}` executable in {search_path}")))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
  use std::os::unix::fs::PermissionsExt;

  path
    .metadata()
    .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
    .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
  path.is_file()
}
