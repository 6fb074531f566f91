use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "panscan.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub extract: ExtractConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
    pub output_csv: PathBuf,
    pub debug_dir: PathBuf,
    /// Number of images processed concurrently. 1 keeps the run strictly sequential.
    pub workers: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("images"),
            labels_dir: PathBuf::from("labels"),
            output_csv: PathBuf::from("extracted_pan_data.csv"),
            debug_dir: PathBuf::from("debug_output"),
            workers: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub sql_output: PathBuf,
    /// Fully qualified table used in generated SQL.
    pub table: String,
    pub remote_url: Option<String>,
    pub remote_table: String,
    /// Environment variable holding the remote API key. The key itself is never
    /// read from the config file.
    pub api_key_env: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            sql_output: PathBuf::from("seed_data.sql"),
            table: "public.pan_users".to_string(),
            remote_url: None,
            remote_table: "pan_users".to_string(),
            api_key_env: "PANSCAN_SEED_API_KEY".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|source| ConfigError::Parse { path: origin.to_path_buf(), source })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text, path)
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `./panscan.toml` and then the
    /// per-user config directory are tried; if neither exists the defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::discover() {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            return Some(local);
        }
        let user = directories::ProjectDirs::from("com", "panscan", "panscan")?
            .config_dir()
            .join(CONFIG_FILE_NAME);
        user.is_file().then_some(user)
    }
}
