//! Operator settings loaded from `settings.toml`.
//!
//! The file lives in the platform config folder unless `--config` points
//! elsewhere:
//! - Linux: ~/.config/bupload/
//! - macOS: ~/Library/Application Support/com.bupload.bupload/
//! - Windows: %APPDATA%/bupload/bupload/config/

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "bupload";
const APP_NAME: &str = "bupload";
const CONFIG_FILENAME: &str = "settings.toml";
const PROCESS_DIR: &str = "processes";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub store: StoreSettings,
    pub output: OutputSettings,
    pub matching: MatchingSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Directory of the JSON process store.
    pub primary_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Where output CSVs are written.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingSettings {
    /// Values ignored by duplicate detection on top of the built-in list.
    pub extra_common_words: Vec<String>,
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
}

/// Default settings file location.
pub fn settings_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

impl Settings {
    /// Load settings from `path`, or from the default location.
    ///
    /// A missing or unparsable file yields defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match settings_path() {
                Some(path) => path,
                None => {
                    warn!("could not determine settings path, using defaults");
                    return Self::default();
                }
            },
        };

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => {
                    info!(path = %path.display(), "loaded settings");
                    settings
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to parse settings, using defaults");
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no settings file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read settings, using defaults");
                Self::default()
            }
        }
    }

    /// Directory of the JSON process store.
    pub fn store_dir(&self) -> PathBuf {
        self.store
            .primary_dir
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.data_dir().join(PROCESS_DIR)))
            .unwrap_or_else(|| PathBuf::from(PROCESS_DIR))
    }

    /// Output directory, `override_dir` first.
    pub fn output_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.output.dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_loads_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            "[matching]\nextra_common_words = [\"head office\"]\n\n[output]\ndir = \"out\"\n",
        )
        .unwrap();

        let settings = Settings::load(Some(&path));
        assert_eq!(settings.matching.extra_common_words, vec!["head office".to_string()]);
        assert_eq!(settings.output_dir(None), PathBuf::from("out"));
        assert_eq!(settings.output_dir(Some(Path::new("x"))), PathBuf::from("x"));
        assert_eq!(settings.store.primary_dir, None);
    }

    #[test]
    fn test_bad_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "[store\nprimary_dir = ").unwrap();
        assert_eq!(Settings::load(Some(&path)), Settings::default());
        assert_eq!(Settings::load(Some(&dir.path().join("absent.toml"))), Settings::default());
    }

    #[test]
    fn test_settings_round_trip() {
        let settings = Settings {
            store: StoreSettings {
                primary_dir: Some(PathBuf::from("/data/processes")),
            },
            ..Settings::default()
        };
        let text = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
        assert_eq!(parsed.store_dir(), PathBuf::from("/data/processes"));
    }
}
