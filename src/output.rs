//! # Output Configuration
//!
//! Controls how the CLI decorates its output. Colors and emoji markers are
//! used only when the terminal supports them and the user has not opted out.
//!
//! The following are respected, in order:
//! - `--color=always|never|auto`
//! - `NO_COLOR` (any value, per https://no-color.org/)
//! - `CLICOLOR=0` and `CLICOLOR_FORCE=1`
//! - `TERM=dumb`
//!
//! In `auto` mode the remaining decision is left to `console`'s terminal
//! detection.

use std::env;

use console::Style;

/// Output configuration for controlling colors and markers.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Builds the configuration from the `--color` flag value and the
    /// environment. Unknown flag values behave like `auto`.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        console::set_colors_enabled(use_color);
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    pub fn without_color() -> Self {
        Self { use_color: false }
    }

    /// `emoji` when decorating output, `plain` otherwise.
    pub fn marker<'a>(&self, emoji: &'a str, plain: &'a str) -> &'a str {
        if self.use_color {
            emoji
        } else {
            plain
        }
    }

    /// A section heading, bold when decorating output.
    pub fn heading(&self, text: &str) -> String {
        self.paint(Style::new().bold(), text)
    }

    /// A hash or path, dimmed when decorating output.
    pub fn detail(&self, text: &str) -> String {
        self.paint(Style::new().dim(), text)
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.use_color {
            style.force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}
