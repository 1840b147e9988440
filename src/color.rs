//! Color utilities for terminal output.
//!
//! Semantic styles (success, error, ...) instead of raw colors, honoring
//! `--color` and whether stdout is a terminal.

use std::fmt::Display;

use owo_colors::OwoColorize;

use crate::cli::ColorOption;

/// Color scheme shared by all command handlers.
pub struct ColorScheme {
  enabled: bool,
}

impl ColorScheme {
  /// Create a color scheme from the user's `--color` preference.
  pub fn new(color_option: ColorOption) -> Self {
    let enabled = match color_option {
      ColorOption::Always => true,
      ColorOption::Never => false,
      ColorOption::Auto => {
        use std::io::IsTerminal;
        std::io::stdout().is_terminal()
      }
    };

    Self { enabled }
  }

  /// Whether ANSI styling is emitted.
  pub fn is_enabled(&self) -> bool {
    self.enabled
  }

  fn paint<T: Display>(&self, text: T, style: impl FnOnce(&T) -> String) -> String {
    if self.enabled { style(&text) } else { text.to_string() }
  }

  /// Success messages (green)
  pub fn success<T: Display>(&self, text: T) -> String {
    self.paint(text, |t| t.green().to_string())
  }

  /// Error messages (bright red, bold)
  pub fn error<T: Display>(&self, text: T) -> String {
    self.paint(text, |t| t.bright_red().bold().to_string())
  }

  /// Informational messages (cyan)
  pub fn info<T: Display>(&self, text: T) -> String {
    self.paint(text, |t| t.cyan().to_string())
  }

  /// Labels and important values (bright white, bold)
  pub fn emphasis<T: Display>(&self, text: T) -> String {
    self.paint(text, |t| t.bright_white().bold().to_string())
  }

  /// URLs (blue, underlined)
  pub fn link<T: Display>(&self, text: T) -> String {
    self.paint(text, |t| t.blue().underline().to_string())
  }

  /// Numbers and status codes (bright blue)
  pub fn number<T: Display>(&self, text: T) -> String {
    self.paint(text, |t| t.bright_blue().to_string())
  }

  /// Commands and identifiers (bright green)
  pub fn code<T: Display>(&self, text: T) -> String {
    self.paint(text, |t| t.bright_green().to_string())
  }

  /// Secondary text (dimmed)
  pub fn dimmed<T: Display>(&self, text: T) -> String {
    self.paint(text, |t| t.dimmed().to_string())
  }
}
