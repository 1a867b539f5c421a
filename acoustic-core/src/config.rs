use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::push::PushConfig;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}
impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "failed to access config: {e}"),
            ConfigError::Parse(e) => write!(f, "failed to parse config: {e}"),
            ConfigError::Serialize(e) => write!(f, "failed to serialize config: {e}"),
        }
    }
}
impl std::error::Error for ConfigError {}
impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}
impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigError::Serialize(e)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub server: Server,
    pub push: Push,
    pub general: General,
}
impl Config {
    pub const FILENAME: &str = "config.toml";

    /// Load [`Self::FILENAME`] from the working directory, falling back to
    /// the defaults if it doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::FILENAME)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config file found at {}, using defaults", path.display());
                Ok(Config::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::FILENAME)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, toml::to_string(self)?)?;
        tracing::info!("saved config to {}", path.display());
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.general.request_timeout_secs)
    }

    /// The push channel settings. Without an explicit `push_url`, the
    /// Socket.IO server is assumed to live at the API root minus `/api`.
    pub fn push_config(&self) -> PushConfig {
        let url = match &self.server.push_url {
            Some(url) => url.clone(),
            None => {
                let base = self.server.base_url.trim_end_matches('/');
                base.strip_suffix("/api").unwrap_or(base).to_string()
            }
        };
        PushConfig {
            url,
            reconnect: self.push.reconnect,
            reconnect_attempts: self.push.reconnect_attempts,
            reconnect_delay: Duration::from_millis(self.push.reconnect_delay_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Server {
    /// Root of the REST API, including any `/api` prefix.
    pub base_url: String,
    /// Root of the Socket.IO server, if it isn't derivable from `base_url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_url: Option<String>,
}
impl Default for Server {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            push_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Push {
    pub reconnect: bool,
    pub reconnect_attempts: u32,
    pub reconnect_delay_ms: u64,
}
impl Default for Push {
    fn default() -> Self {
        Self {
            reconnect: true,
            reconnect_attempts: 5,
            reconnect_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct General {
    pub request_timeout_secs: u64,
}
impl Default for General {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
        }
    }
}
