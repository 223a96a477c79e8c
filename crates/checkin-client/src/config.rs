use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Client configuration: an optional TOML file, then `CHECKIN_*` overrides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend base URL (default: http://localhost:5000).
    pub server_url: String,
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Frames discarded after the stream starts while exposure settles.
    pub warmup_frames: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            camera_device: "/dev/video0".to_string(),
            warmup_frames: 4,
        }
    }
}

impl ClientConfig {
    /// Load the config file if present, then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded client config");
        Ok(config)
    }

    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(url) = var("CHECKIN_SERVER_URL") {
            self.server_url = url;
        }
        if let Some(device) = var("CHECKIN_CAMERA_DEVICE") {
            self.camera_device = device;
        }
        if let Some(frames) = var("CHECKIN_WARMUP_FRAMES").and_then(|v| v.parse().ok()) {
            self.warmup_frames = frames;
        }
    }
}

/// `CHECKIN_CONFIG`, else `$XDG_CONFIG_HOME/checkin/config.toml` (falling back to `~/.config`).
fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CHECKIN_CONFIG") {
        return Some(PathBuf::from(path));
    }
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".config")))
        .ok()?;
    Some(base.join("checkin").join("config.toml"))
}
