//! Presence hub for the Plaza relay.
//!
//! The hub runs as a single Tokio task (actor model) that owns the
//! [`SessionRegistry`](plaza_registry::SessionRegistry). Connection handlers
//! talk to it through a [`HubHandle`]; outbound events come back on one
//! unbounded channel per connection.
//!
//! # Per-connection state machine
//!
//! ```text
//! Connected ──join──→ Joined ──(move | auth-update | query | dm | ...)*──→ Disconnected
//!    attach()                                                     detach() / disconnect / sweep
//! ```
//!
//! # Key types
//!
//! - [`spawn_hub`]: starts the actor
//! - [`HubHandle`]: attach, deliver events, detach, read snapshots
//! - [`HubConfig`]: proximity radius, sweep cadence, session timeout
//! - [`HubError`]: the hub is gone

mod config;
mod error;
mod hub;

pub use config::HubConfig;
pub use error::HubError;
pub use hub::{HubHandle, HubStats, PlayerSnapshot, SessionSender, spawn_hub};
