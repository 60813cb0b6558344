//! Session registry for the Plaza presence relay.
//!
//! The registry is the single source of truth for who is in the world:
//!
//! 1. **Session records**: position, avatar, name, and auth flags per
//!    connected client ([`Session`]).
//! 2. **Lifecycle**: create on join, merge updates, remove on disconnect,
//!    sweep on inactivity ([`SessionRegistry`]).
//! 3. **Names**: generated display names are reserved while their owner is
//!    live and released afterwards ([`NamePool`]).
//! 4. **Proximity**: radius queries through a pluggable [`SpatialIndex`].
//!
//! # How it fits in the stack
//!
//! ```text
//! Hub (above)  ← serializes every registry call through one actor
//!     ↕
//! Registry (this crate)  ← plain data structure, no locking of its own
//!     ↕
//! Protocol (below)  ← SessionId, Position, SessionView
//! ```

mod error;
mod names;
mod registry;
mod session;
mod spatial;

pub use error::RegistryError;
pub use names::{DEFAULT_BASE_NAMES, NameConfig, NamePool};
pub use registry::{RegistryConfig, SessionRegistry};
pub use session::{NameOrigin, Session, SessionInit, SessionPatch};
pub use spatial::{LinearIndex, SpatialIndex};
