//! Configuration loading for the relay binary.
//!
//! Every section and field is optional; a missing file section falls back
//! to the defaults below. Example `plaza.toml`:
//!
//! ```toml
//! [server]
//! bind = "0.0.0.0:3001"
//! http_bind = "0.0.0.0:3002"
//! handshake_timeout_secs = 10
//!
//! [hub]
//! proximity_radius = 200.0
//! sweep_interval_secs = 60
//! session_timeout_secs = 300
//!
//! [world]
//! spawn_x = 1920.0
//! spawn_y = 1280.0
//! default_avatar = "avatar-front"
//!
//! [names]
//! base_names = ["Explorer", "Nomad"]
//! suffix_range = 9999
//! max_attempts = 50
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use plaza_hub::HubConfig;
use plaza_protocol::Position;
use plaza_registry::{DEFAULT_BASE_NAMES, NameConfig, RegistryConfig};
use plaza_transport::DEFAULT_HANDSHAKE_TIMEOUT;
use serde::Deserialize;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlazaConfig {
    pub server: ServerConfig,
    pub hub: HubSection,
    pub world: WorldConfig,
    pub names: NamesConfig,
}

/// Listener addresses.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// WebSocket listener.
    pub bind: String,
    /// Roster and health endpoints. Empty disables the HTTP surface.
    pub http_bind: String,
    /// How long a new peer has to complete the WebSocket upgrade.
    pub handshake_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3001".to_string(),
            http_bind: "0.0.0.0:3002".to_string(),
            handshake_timeout_secs: DEFAULT_HANDSHAKE_TIMEOUT.as_secs(),
        }
    }
}

/// Hub tunables, in config-file units.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HubSection {
    pub proximity_radius: f64,
    pub sweep_interval_secs: u64,
    pub session_timeout_secs: u64,
    pub mailbox_capacity: usize,
}

impl Default for HubSection {
    fn default() -> Self {
        let hub = HubConfig::default();
        Self {
            proximity_radius: hub.proximity_radius,
            sweep_interval_secs: hub.sweep_interval.as_secs(),
            session_timeout_secs: hub.session_timeout.as_secs(),
            mailbox_capacity: hub.mailbox_capacity,
        }
    }
}

/// Join defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub spawn_x: f64,
    pub spawn_y: f64,
    pub default_avatar: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        let registry = RegistryConfig::default();
        Self {
            spawn_x: registry.spawn.x,
            spawn_y: registry.spawn.y,
            default_avatar: registry.default_avatar,
        }
    }
}

/// Generated display names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NamesConfig {
    pub base_names: Vec<String>,
    pub suffix_range: u32,
    pub max_attempts: u32,
}

impl Default for NamesConfig {
    fn default() -> Self {
        Self {
            base_names: DEFAULT_BASE_NAMES.iter().map(|s| s.to_string()).collect(),
            suffix_range: 9999,
            max_attempts: 50,
        }
    }
}

impl PlazaConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Replaces the WebSocket listener's port, keeping its host.
    ///
    /// # Errors
    /// [`ConfigError::InvalidPort`] if `port` is not a valid port number.
    pub fn with_port(mut self, port: &str) -> Result<Self, ConfigError> {
        let port: u16 = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPort(port.to_string()))?;
        let host = match self.server.bind.rsplit_once(':') {
            Some((host, _)) => host.to_string(),
            None => self.server.bind.clone(),
        };
        self.server.bind = format!("{host}:{port}");
        Ok(self)
    }

    /// The hub configuration these settings describe.
    pub fn hub_config(&self) -> HubConfig {
        HubConfig {
            proximity_radius: self.hub.proximity_radius,
            sweep_interval: Duration::from_secs(self.hub.sweep_interval_secs),
            session_timeout: Duration::from_secs(self.hub.session_timeout_secs),
            mailbox_capacity: self.hub.mailbox_capacity,
            registry: RegistryConfig {
                spawn: Position::new(self.world.spawn_x, self.world.spawn_y),
                default_avatar: self.world.default_avatar.clone(),
                names: NameConfig {
                    base_names: self.names.base_names.clone(),
                    suffix_range: self.names.suffix_range,
                    max_attempts: self.names.max_attempts,
                },
                name_seed: None,
            },
        }
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.server.handshake_timeout_secs)
    }

    /// HTTP listener address, or `None` when the surface is disabled.
    pub fn http_bind(&self) -> Option<&str> {
        let addr = self.server.http_bind.trim();
        (!addr.is_empty()).then_some(addr)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// `PORT` was set to something that isn't a port number.
    #[error("invalid port {0:?}")]
    InvalidPort(String),
}
