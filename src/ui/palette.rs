//! ANSI styling for the chat loop's prefixes and status lines.

use std::io::IsTerminal;

use crate::ui::appearance::Appearance;

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";
const ERROR: &str = "\x1b[31m";

/// Escape sequences derived from the configured accent color. Disabled
/// palettes render text unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    accent: Option<&'static str>,
    enabled: bool,
}

impl Palette {
    pub fn new(accent: &str, appearance: Option<Appearance>, enabled: bool) -> Self {
        Self {
            accent: accent_code(accent, appearance),
            enabled,
        }
    }

    /// Color on for an interactive stdout unless `NO_COLOR` is set.
    pub fn detect(accent: &str, appearance: Option<Appearance>) -> Self {
        let enabled = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self::new(accent, appearance, enabled)
    }

    pub fn accent(&self, text: &str) -> String {
        match self.accent {
            Some(code) => self.wrap(code, text),
            None => text.to_string(),
        }
    }

    pub fn dim(&self, text: &str) -> String {
        self.wrap(DIM, text)
    }

    pub fn error(&self, text: &str) -> String {
        self.wrap(ERROR, text)
    }

    fn wrap(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

/// Black on a dark terminal or white on a light one would vanish; those fall
/// back to the default foreground.
fn accent_code(accent: &str, appearance: Option<Appearance>) -> Option<&'static str> {
    match (accent, appearance) {
        ("black", Some(Appearance::Dark)) | ("white", Some(Appearance::Light)) => None,
        ("black", _) => Some("\x1b[30m"),
        ("white", _) => Some("\x1b[37m"),
        ("red", _) => Some("\x1b[31m"),
        ("green", _) => Some("\x1b[32m"),
        _ => Some("\x1b[34m"),
    }
}
