use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::utils::url::{normalize_base_url, DEFAULT_BASE_URL};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_ACCENT_COLOR: &str = "blue";

/// Accent colors the front end knows how to render.
pub const ACCENT_COLORS: &[&str] = &["blue", "red", "black", "white", "green"];

/// Persisted user settings.
///
/// Every field has a default so that a partially written or hand-edited file
/// still loads. Older files used snake_case keys and `model` for the default
/// model; those spellings are accepted on read and never written.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Sent as a bearer token only when non-empty.
    #[serde(alias = "api_key")]
    pub api_key: String,
    #[serde(alias = "base_url")]
    pub base_url: String,
    #[serde(alias = "default_model", alias = "model")]
    pub default_model: String,
    /// Prepended to every chat request as a system message when non-empty.
    #[serde(alias = "system_prompt")]
    pub system_prompt: String,
    #[serde(alias = "accent_color")]
    pub accent_color: String,
    pub temperature: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: String::new(),
            system_prompt: String::new(),
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl Settings {
    /// Returns a copy with whitespace trimmed from the text fields and the
    /// base URL normalized to a single trailing slash.
    pub fn normalized(&self) -> Self {
        Self {
            api_key: self.api_key.trim().to_string(),
            base_url: normalize_base_url(&self.base_url),
            default_model: self.default_model.trim().to_string(),
            system_prompt: self.system_prompt.clone(),
            accent_color: self.accent_color.trim().to_ascii_lowercase(),
            temperature: self.temperature,
        }
    }

    /// The accent color to render with; unknown names fall back to blue.
    pub fn accent(&self) -> &str {
        let wanted = self.accent_color.trim();
        ACCENT_COLORS
            .iter()
            .find(|color| color.eq_ignore_ascii_case(wanted))
            .copied()
            .unwrap_or(DEFAULT_ACCENT_COLOR)
    }

    /// Update one field from its user-facing key, as typed on the command line.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "api-key" | "apiKey" | "api_key" => self.api_key = value.to_string(),
            "base-url" | "baseUrl" | "base_url" => self.base_url = value.to_string(),
            "default-model" | "defaultModel" | "model" => self.default_model = value.to_string(),
            "system-prompt" | "systemPrompt" => self.system_prompt = value.to_string(),
            "accent-color" | "accentColor" => {
                let color = value.trim().to_ascii_lowercase();
                if !ACCENT_COLORS.contains(&color.as_str()) {
                    return Err(format!(
                        "Unknown accent color '{value}'. Choose one of: {}",
                        ACCENT_COLORS.join(", ")
                    ));
                }
                self.accent_color = color;
            }
            "temperature" => {
                let parsed: f32 = value
                    .trim()
                    .parse()
                    .map_err(|_| format!("Temperature must be a number, got '{value}'"))?;
                if !(0.0..=2.0).contains(&parsed) {
                    return Err("Temperature must be between 0 and 2".to_string());
                }
                self.temperature = parsed;
            }
            _ => {
                return Err(format!(
                    "Unknown setting '{key}'. Known settings: api-key, base-url, default-model, system-prompt, accent-color, temperature"
                ))
            }
        }
        Ok(())
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
