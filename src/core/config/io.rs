use crate::api::ModelInfo;
use crate::core::config::data::{path_display, Settings};
use directories::ProjectDirs;
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

const SETTINGS_FILE: &str = "settings.json";
const MODEL_CACHE_FILE: &str = "models.json";

/// Errors that can occur when reading or writing configuration on disk.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read a configuration file from disk.
    Read {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file exists but is not valid JSON of the expected shape.
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to write or atomically replace a configuration file.
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The platform did not report a per-user configuration directory.
    NoConfigDir,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, source } => {
                write!(
                    f,
                    "Failed to read config at {}: {}",
                    path_display(path),
                    source
                )
            }
            ConfigError::Parse { path, source } => {
                write!(
                    f,
                    "Failed to parse config at {}: {}",
                    path_display(path),
                    source
                )
            }
            ConfigError::Write { path, source } => {
                write!(
                    f,
                    "Failed to write config at {}: {}",
                    path_display(path),
                    source
                )
            }
            ConfigError::NoConfigDir => {
                write!(f, "Could not determine a configuration directory")
            }
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Write { source, .. } => Some(source),
            ConfigError::NoConfigDir => None,
        }
    }
}

/// Owns the location of the settings file and the model cache next to it.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    settings_path: PathBuf,
}

impl ConfigStore {
    pub fn new(settings_path: PathBuf) -> Self {
        Self { settings_path }
    }

    /// Store rooted at the per-user configuration directory.
    pub fn default_location() -> Result<Self, ConfigError> {
        let proj_dirs = ProjectDirs::from("org", "parley", "parley").ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::new(proj_dirs.config_dir().join(SETTINGS_FILE)))
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    pub fn model_cache_path(&self) -> PathBuf {
        match self.settings_path.parent() {
            Some(dir) => dir.join(MODEL_CACHE_FILE),
            None => PathBuf::from(MODEL_CACHE_FILE),
        }
    }

    /// Loads settings, falling back to defaults when the file is missing,
    /// unreadable or malformed.
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(settings) => settings,
            Err(err) => {
                warn!(error = %err, "using default settings");
                Settings::default()
            }
        }
    }

    pub fn try_load(&self) -> Result<Settings, ConfigError> {
        if !self.settings_path.exists() {
            debug!(path = %self.settings_path.display(), "no settings file yet");
            return Ok(Settings::default());
        }
        let contents =
            fs::read_to_string(&self.settings_path).map_err(|source| ConfigError::Read {
                path: self.settings_path.clone(),
                source,
            })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: self.settings_path.clone(),
            source,
        })
    }

    /// Normalizes and atomically writes `settings`, returning what was written.
    pub fn save(&self, settings: &Settings) -> Result<Settings, ConfigError> {
        let normalized = settings.normalized();
        write_json_atomically(&self.settings_path, &normalized)?;
        debug!(path = %self.settings_path.display(), "settings saved");
        Ok(normalized)
    }

    /// Model ids from the last successful fetch, or an empty list.
    pub fn load_model_cache(&self) -> Vec<ModelInfo> {
        let path = self.model_cache_path();
        let Ok(contents) = fs::read_to_string(&path) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<String>>(&contents) {
            Ok(ids) => crate::api::models::dedupe_model_ids(ids),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring corrupt model cache");
                Vec::new()
            }
        }
    }

    pub fn save_model_cache(&self, models: &[ModelInfo]) -> Result<(), ConfigError> {
        let ids: Vec<&str> = models.iter().map(|model| model.id.as_str()).collect();
        write_json_atomically(&self.model_cache_path(), &ids)
    }
}

fn write_json_atomically<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ConfigError> {
    let write_err = |source: std::io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = parent {
        fs::create_dir_all(dir).map_err(write_err)?;
    }

    let contents = serde_json::to_string_pretty(value)
        .map_err(|err| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))?;
    let mut temp_file = match parent {
        Some(dir) => NamedTempFile::new_in(dir),
        None => NamedTempFile::new_in("."),
    }
    .map_err(write_err)?;

    temp_file.write_all(contents.as_bytes()).map_err(write_err)?;
    temp_file.write_all(b"\n").map_err(write_err)?;
    temp_file.as_file_mut().sync_all().map_err(write_err)?;
    temp_file
        .persist(path)
        .map_err(|err| write_err(err.error))?;
    Ok(())
}
