//! Settings - TOML File With Fallback Chain
//!
//! Lookup order: explicit path, `./scriptgen.toml`,
//! `<config dir>/scriptgen/scriptgen.toml`, then built-in defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{SCRIPTS_FILE, TEMPLATES_FILE};
use crate::validation::ValidationLists;

pub const LOCAL_CONFIG_FILE: &str = "scriptgen.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub curator: CuratorSettings,
    pub catalog: CatalogSettings,
    pub export: ExportSettings,
    pub lists: ValidationLists,
}

/// Curator defaults applied when a session input leaves them blank.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CuratorSettings {
    #[serde(rename = "your-name")]
    pub your_name: String,

    #[serde(rename = "your-first-name")]
    pub your_first_name: String,

    #[serde(rename = "staff-level")]
    pub staff_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CatalogSettings {
    pub dir: PathBuf,

    #[serde(rename = "scripts-file")]
    pub scripts_file: String,

    #[serde(rename = "templates-file")]
    pub templates_file: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("catalog"),
            scripts_file: SCRIPTS_FILE.to_string(),
            templates_file: TEMPLATES_FILE.to_string(),
        }
    }
}

impl CatalogSettings {
    pub fn scripts_path(&self) -> PathBuf {
        self.dir.join(&self.scripts_file)
    }

    pub fn templates_path(&self) -> PathBuf {
        self.dir.join(&self.templates_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExportSettings {
    pub dir: PathBuf,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self { dir: PathBuf::from("exports") }
    }
}

impl Settings {
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        let user = dirs::config_dir().map(|dir| dir.join("scriptgen").join(LOCAL_CONFIG_FILE));

        for candidate in std::iter::once(local).chain(user) {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(settings) => return Ok(settings),
                Err(e) => warn!("Skipping config {}: {}", candidate.display(), e),
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from: {}", path.display());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scriptgen.toml");
        fs::write(
            &path,
            r#"
[curator]
your-name = "bob"
your-first-name = "Bob"

[lists.disallowed]
snap = ["spammer"]
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.curator.your_name, "bob");
        assert_eq!(settings.catalog, CatalogSettings::default());
        assert_eq!(settings.lists.disallowed["snap"], vec!["spammer"]);
        assert!(settings.lists.cautioned.is_empty());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let err = Settings::load(Some(Path::new("/nonexistent/scriptgen.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "curator = 3").unwrap();
        assert!(matches!(Settings::load_from_file(&path), Err(ConfigError::Parse { .. })));
    }
}
