// config.rs
//! Per-user settings file holding the output directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = ".webp_converter_config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("config file {} has no output_dir", .path.display())]
    MissingOutputDir { path: PathBuf },
    #[error("failed to write config file {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("output directory {} is unusable: {source}", .path.display())]
    OutputDir { path: PathBuf, source: io::Error },
    #[error("failed to serialize config: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// On-disk shape: `{"output_dir": "..."}`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_dir: Option<PathBuf>,
}

pub struct ConfigStore {
    config_file: PathBuf,
    output_dir: PathBuf,
}

impl ConfigStore {
    /// Store at `~/.webp_converter_config.json`, defaulting to `~/Pictures/WebpConverter`.
    pub fn for_current_user() -> Self {
        let home = home_dir();
        Self::load(
            home.join(CONFIG_FILE_NAME),
            home.join("Pictures").join("WebpConverter"),
        )
    }

    /// Reads `config_file`, falling back to `default_output_dir` on any problem,
    /// including a configured directory that cannot be created.
    /// The resulting directory is created if it does not exist yet.
    pub fn load(config_file: PathBuf, default_output_dir: PathBuf) -> Self {
        let configured = match read_output_dir(&config_file) {
            Ok(dir) => Some(dir),
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                info!("No config file at {}, using default output directory", config_file.display());
                None
            }
            Err(e) => {
                warn!("Error loading config: {e}");
                None
            }
        };

        if let Some(dir) = configured {
            match ensure_dir(&dir) {
                Ok(()) => {
                    return Self {
                        config_file,
                        output_dir: dir,
                    }
                }
                Err(e) => warn!("{e}, using default output directory"),
            }
        }

        if let Err(e) = ensure_dir(&default_output_dir) {
            warn!("{e}");
        }
        Self {
            config_file,
            output_dir: default_output_dir,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn set_output_directory(&mut self, new_dir: PathBuf) {
        info!("Output directory changed to {}", new_dir.display());
        self.output_dir = new_dir;
        self.save();
    }

    /// Writes the current directory to disk. Errors are logged, never returned.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            warn!("Error saving config: {e}");
        }
    }

    fn try_save(&self) -> Result<(), ConfigError> {
        let file = ConfigFile {
            output_dir: Some(self.output_dir.clone()),
        };
        let json = serde_json::to_string(&file).map_err(ConfigError::Serialize)?;
        fs::write(&self.config_file, json).map_err(|source| ConfigError::Write {
            path: self.config_file.clone(),
            source,
        })
    }
}

fn read_output_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ConfigFile = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    file.output_dir
        .filter(|dir| !dir.as_os_str().is_empty())
        .ok_or_else(|| ConfigError::MissingOutputDir {
            path: path.to_path_buf(),
        })
}

/// Creates `dir` and its parents, then checks that the result really is a directory.
fn ensure_dir(dir: &Path) -> Result<(), ConfigError> {
    fs::create_dir_all(dir).map_err(|source| ConfigError::OutputDir {
        path: dir.to_path_buf(),
        source,
    })?;
    if dir.is_dir() {
        Ok(())
    } else {
        Err(ConfigError::OutputDir {
            path: dir.to_path_buf(),
            source: io::Error::new(io::ErrorKind::Other, "not a directory"),
        })
    }
}

fn home_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
