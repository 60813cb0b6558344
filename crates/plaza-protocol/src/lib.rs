//! Wire protocol for the Plaza presence relay.
//!
//! This crate defines what browser clients and the relay say to each other:
//!
//! - **Identity and geometry** ([`SessionId`], [`Position`]).
//! - **Events** ([`ClientEvent`] inbound, [`ServerEvent`] outbound), each a
//!   closed set of named shapes rather than an open JSON map.
//! - **Routing** ([`Recipient`]): who an outbound event is for.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): events to and from bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (frames) → Protocol (events) → Hub (routing + registry)
//! ```

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, NearbyPlayer, SenderSummary, ServerEvent, SessionView};
pub use types::{Position, Recipient, SessionId, unix_millis};
