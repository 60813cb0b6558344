//! # Plaza
//!
//! Real-time presence and broadcast relay for browser worlds.
//!
//! Browser clients connect over WebSocket, join with a position and an
//! avatar, and from then on the relay keeps everyone aware of each other:
//! joins, moves, renames, and departures fan out to the other sessions,
//! while direct messages, typing indicators, and payment notices go to a
//! single target. A periodic sweep evicts sessions that stop talking.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plaza::prelude::*;
//!
//! # async fn start() -> Result<(), PlazaError> {
//! let server = PlazaServer::builder()
//!     .bind("0.0.0.0:3001")
//!     .http_bind("0.0.0.0:3002")
//!     .hub_config(HubConfig::default())
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod http;
mod server;

pub use config::{ConfigError, HubSection, NamesConfig, PlazaConfig, ServerConfig, WorldConfig};
pub use error::PlazaError;
pub use http::{HealthStatus, PlayerEntry, PlayersResponse};
pub use server::{PlazaServer, PlazaServerBuilder};

/// Everything needed to embed the relay.
pub mod prelude {
    pub use crate::{PlazaConfig, PlazaError, PlazaServer, PlazaServerBuilder};
    pub use plaza_hub::{HubConfig, HubHandle};
    pub use plaza_protocol::{ClientEvent, Position, ServerEvent, SessionId};
    pub use plaza_registry::{NameConfig, RegistryConfig};
}
