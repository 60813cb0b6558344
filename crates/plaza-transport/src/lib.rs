//! Transport abstraction layer for the Plaza presence relay.
//!
//! Provides the [`Transport`] and [`Connection`] traits so the relay's
//! connection handling does not depend on a particular socket library, and
//! the [`ConnectionId`] the transport assigns to every accepted connection.
//! That id becomes the session id the rest of the relay uses.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{
    DEFAULT_HANDSHAKE_TIMEOUT, PendingWebSocket, WebSocketConnection, WebSocketTransport,
};

use std::fmt;

/// Opaque identifier for a connection, unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
///
/// Accepting is split in two: [`accept`](Transport::accept) only takes the
/// next peer off the listener, and [`PendingConnection::upgrade`] runs the
/// protocol handshake. Callers run the upgrade on the connection's own task
/// so a peer that never finishes its handshake cannot hold up the listener.
pub trait Transport: Send + Sync + 'static {
    /// A peer that has connected but not yet completed the handshake.
    type Pending: PendingConnection<Connection = Self::Connection, Error = Self::Error>;
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next peer.
    async fn accept(&mut self) -> Result<Self::Pending, Self::Error>;

    /// Returns the address the transport is listening on.
    fn local_addr(&self) -> Result<std::net::SocketAddr, Self::Error>;
}

/// An accepted peer awaiting its handshake.
pub trait PendingConnection: Send + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Remote address of the peer.
    fn peer_addr(&self) -> std::net::SocketAddr;

    /// Completes the handshake. Implementations bound how long this waits.
    async fn upgrade(self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection that can send and receive frames.
///
/// Implementations must allow `send` and `recv` to run concurrently from
/// different tasks: the relay pushes outbound events while a reader task is
/// parked in `recv`.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
