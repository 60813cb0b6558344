//! Unified error type for the Plaza relay.

use plaza_hub::HubError;
use plaza_transport::TransportError;

use crate::config::ConfigError;

/// Top-level error that wraps every layer's error.
///
/// The `#[from]` attributes let `?` convert sub-crate errors directly.
#[derive(Debug, thiserror::Error)]
pub enum PlazaError {
    /// Binding the WebSocket listener, or sending and receiving on a
    /// connection, failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The presence hub has stopped.
    #[error(transparent)]
    Hub(#[from] HubError),

    /// Binding or serving the HTTP listener failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file or environment was unusable.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
