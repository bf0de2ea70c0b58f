//! Trainer settings persisted as TOML.
//!
//! Every field is optional in the file; missing keys fall back to the
//! defaults below so older configs keep loading.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::Error as SerdeDeError};
use thiserror::Error;

use crate::app_dirs;
use crate::ml::online::{Algorithm, NbsvmOptions};

/// Default filename used to store the trainer configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Hyperparameters and pass control for `lintext train`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainSettings {
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Passes over the training files.
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default = "default_eta")]
    pub eta: f64,
    #[serde(default = "default_lambda")]
    pub lambda: f64,
    #[serde(default = "default_true")]
    pub adagrad: bool,
    /// Shuffle each pass with this seed; file order when absent.
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

impl Default for TrainSettings {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            iterations: default_iterations(),
            alpha: default_alpha(),
            eta: default_eta(),
            lambda: default_lambda(),
            adagrad: default_true(),
            shuffle_seed: None,
        }
    }
}

impl TrainSettings {
    /// Reject values the learners cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.eta.is_finite() && self.eta > 0.0) {
            return Err(ConfigError::Invalid {
                field: "eta",
                reason: format!("must be a positive number, got {}", self.eta),
            });
        }
        if !(self.alpha.is_finite() && self.alpha > 0.0) {
            return Err(ConfigError::Invalid {
                field: "alpha",
                reason: format!("must be a positive number, got {}", self.alpha),
            });
        }
        if !(self.lambda.is_finite() && self.lambda >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "lambda",
                reason: format!("must be zero or positive, got {}", self.lambda),
            });
        }
        if self.iterations == 0 {
            return Err(ConfigError::Invalid {
                field: "iterations",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Learner options derived from these settings.
    pub fn to_options(&self) -> NbsvmOptions {
        NbsvmOptions {
            alpha: self.alpha,
            eta: self.eta,
            lambda: self.lambda,
            adagrad: self.adagrad,
            ..NbsvmOptions::default()
        }
    }
}

/// Errors that may occur while loading or saving trainer configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    #[error("Invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("No suitable config directory found")]
    NoConfigDir,
}

/// Resolve the default configuration file path inside the app directory.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dir = app_dirs::app_root_dir().map_err(map_app_dir_error)?;
    Ok(dir.join(CONFIG_FILE_NAME))
}

/// Load settings from the app directory, returning defaults if missing.
pub fn load_or_default() -> Result<TrainSettings, ConfigError> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(TrainSettings::default());
    }
    load_from(&path)
}

/// Load settings from an explicit TOML file.
pub fn load_from(path: &Path) -> Result<TrainSettings, ConfigError> {
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8(bytes).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source: SerdeDeError::custom(source),
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Save settings to a specific path, creating parent directories as needed.
pub fn save_to_path(settings: &TrainSettings, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let data = toml::to_string_pretty(settings).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, data).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn map_app_dir_error(error: app_dirs::AppDirError) -> ConfigError {
    match error {
        app_dirs::AppDirError::NoBaseDir => ConfigError::NoConfigDir,
        app_dirs::AppDirError::CreateDir { path, source } => {
            ConfigError::CreateDir { path, source }
        }
    }
}

fn default_iterations() -> usize {
    10
}

fn default_alpha() -> f64 {
    0.01
}

fn default_eta() -> f64 {
    0.1
}

fn default_lambda() -> f64 {
    1.0e-8
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_dirs::ConfigBaseGuard;
    use tempfile::tempdir;

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "algorithm = \"perceptron\"\neta = 0.5\n").unwrap();
        let settings = load_from(&path).unwrap();
        assert_eq!(settings.algorithm, Algorithm::Perceptron);
        assert_eq!(settings.eta, 0.5);
        assert_eq!(settings.iterations, 10);
        assert_eq!(settings.alpha, 0.01);
        assert!(settings.adagrad);
        assert_eq!(settings.shuffle_seed, None);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let settings = TrainSettings {
            algorithm: Algorithm::NbsvmBasic,
            iterations: 3,
            adagrad: false,
            shuffle_seed: Some(42),
            ..TrainSettings::default()
        };
        save_to_path(&settings, &path).unwrap();
        assert_eq!(load_from(&path).unwrap(), settings);
    }

    #[test]
    fn unknown_algorithm_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "algorithm = \"forest\"\n").unwrap();
        assert!(matches!(
            load_from(&path),
            Err(ConfigError::ParseToml { .. })
        ));
    }

    #[test]
    fn load_or_default_without_file_returns_defaults() {
        let base = tempdir().unwrap();
        let _guard = ConfigBaseGuard::set(base.path().to_path_buf());
        assert_eq!(load_or_default().unwrap(), TrainSettings::default());
    }

    #[test]
    fn load_or_default_reads_app_dir_config() {
        let base = tempdir().unwrap();
        let _guard = ConfigBaseGuard::set(base.path().to_path_buf());
        let path = config_path().unwrap();
        std::fs::write(&path, "iterations = 4\n").unwrap();
        assert_eq!(load_or_default().unwrap().iterations, 4);
    }

    #[test]
    fn validate_rejects_unusable_values() {
        let bad_eta = TrainSettings {
            eta: 0.0,
            ..TrainSettings::default()
        };
        assert!(matches!(
            bad_eta.validate(),
            Err(ConfigError::Invalid { field: "eta", .. })
        ));
        for alpha in [0.0, -1.0, f64::NAN] {
            let bad_alpha = TrainSettings {
                alpha,
                ..TrainSettings::default()
            };
            assert!(matches!(
                bad_alpha.validate(),
                Err(ConfigError::Invalid { field: "alpha", .. })
            ));
        }
        assert!(TrainSettings::default().validate().is_ok());
    }

    #[test]
    fn options_carry_hyperparameters() {
        let settings = TrainSettings {
            alpha: 0.5,
            eta: 0.2,
            lambda: 0.0,
            adagrad: false,
            ..TrainSettings::default()
        };
        let options = settings.to_options();
        assert_eq!(options.alpha, 0.5);
        assert_eq!(options.eta, 0.2);
        assert_eq!(options.lambda, 0.0);
        assert!(!options.adagrad);
        assert!(options.naive_bayes);
    }
}
