//! Runtime settings, read from an optional TOML file.
//!
//! Every field has a default, so an absent file or a partial file is valid.
//! Command-line flags take precedence over values from the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_DATASET_PATH: &str = "demos/credit_score_dataset.csv";
pub const DEFAULT_MODEL_PATH: &str = "demos/credit_model.toml";
pub const DEFAULT_CONTACT_PHONE: &str = "+234 905 460 9925";
pub const DEFAULT_CONTACT_EMAIL: &str = "Creditforfarmers@gmail.com";
pub const DEFAULT_DASHBOARD_URL: &str = "https://app.powerbi.com/view?r=eyJrIjoiNzRkYWM3MjAtODA2Zi00YzdiLWJjMTktMjdkODI4NGM3YTQwIiwidCI6IjhjNmEzZDFhLWY5N2ItNDBjMC05ZTgxLTMxYzEwOTQxMzU3NiJ9";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings file '{path}': {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML settings file: {0}")]
    TomlParseError(#[from] toml::de::Error),
}

/// How applicants with a Credible verdict continue their application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub phone: String,
    pub email: String,
}

impl Default for ContactDetails {
    fn default() -> Self {
        Self {
            phone: DEFAULT_CONTACT_PHONE.to_string(),
            email: DEFAULT_CONTACT_EMAIL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub dataset_path: PathBuf,
    pub model_path: PathBuf,
    pub contact: ContactDetails,
    pub dashboard_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            contact: ContactDetails::default(),
            dashboard_url: DEFAULT_DASHBOARD_URL.to_string(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = toml::from_str(&text)?;
        log::debug!("Loaded settings from '{}'", path.display());
        Ok(settings)
    }

    /// Reads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, SettingsError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "model_path = \"models/forest.toml\"").unwrap();
        writeln!(file, "[contact]").unwrap();
        writeln!(file, "phone = \"+234 800 000 0000\"").unwrap();
        writeln!(file, "email = \"loans@example.org\"").unwrap();
        file.flush().unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.model_path, PathBuf::from("models/forest.toml"));
        assert_eq!(settings.dataset_path, PathBuf::from(DEFAULT_DATASET_PATH));
        assert_eq!(settings.contact.email, "loans@example.org");
        assert_eq!(settings.dashboard_url, DEFAULT_DASHBOARD_URL);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "modle_path = \"typo.toml\"").unwrap();
        file.flush().unwrap();
        assert!(matches!(
            Settings::load(file.path()),
            Err(SettingsError::TomlParseError(_))
        ));
    }

    #[test]
    fn no_file_means_defaults() {
        assert_eq!(Settings::load_or_default(None).unwrap(), Settings::default());
    }
}
