//! `PlazaServer` builder and accept loop.
//!
//! Ties the layers together: WebSocket transport, JSON codec, and the
//! presence hub, plus the optional HTTP surface for operators.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use plaza_hub::{HubConfig, HubHandle, spawn_hub};
use plaza_protocol::JsonCodec;
use plaza_transport::{
    DEFAULT_HANDSHAKE_TIMEOUT, PendingConnection, PendingWebSocket, Transport, WebSocketTransport,
};
use tokio::net::TcpListener;

use crate::PlazaError;
use crate::handler::handle_connection;
use crate::http::build_router;

/// State shared by every connection task and the HTTP handlers.
pub(crate) struct ServerState {
    pub(crate) hub: HubHandle,
    pub(crate) codec: JsonCodec,
    pub(crate) started: Instant,
}

/// Builder for configuring and starting a relay.
///
/// # Example
///
/// ```rust,no_run
/// # async fn start() -> Result<(), plaza::PlazaError> {
/// use plaza::PlazaServer;
///
/// let server = PlazaServer::builder()
///     .bind("0.0.0.0:3001")
///     .http_bind("0.0.0.0:3002")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct PlazaServerBuilder {
    bind_addr: String,
    http_addr: Option<String>,
    hub_config: HubConfig,
    handshake_timeout: Duration,
}

impl PlazaServerBuilder {
    /// Creates a builder with default settings and no HTTP surface.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:3001".to_string(),
            http_addr: None,
            hub_config: HubConfig::default(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        }
    }

    /// Sets the WebSocket listener address.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Enables the roster and health endpoints on `addr`.
    pub fn http_bind(mut self, addr: &str) -> Self {
        self.http_addr = Some(addr.to_string());
        self
    }

    pub fn hub_config(mut self, config: HubConfig) -> Self {
        self.hub_config = config;
        self
    }

    /// Sets how long a new peer has to send its WebSocket upgrade request.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Binds the listeners and starts the hub.
    ///
    /// # Errors
    /// Fails if either address cannot be bound.
    pub async fn build(self) -> Result<PlazaServer, PlazaError> {
        let transport = WebSocketTransport::bind(&self.bind_addr)
            .await?
            .with_handshake_timeout(self.handshake_timeout);
        let http = match &self.http_addr {
            Some(addr) => {
                let listener = TcpListener::bind(addr).await?;
                tracing::info!(addr = %addr, "HTTP listener bound");
                Some(listener)
            }
            None => None,
        };

        let state = Arc::new(ServerState {
            hub: spawn_hub(self.hub_config),
            codec: JsonCodec,
            started: Instant::now(),
        });

        Ok(PlazaServer {
            transport,
            http,
            state,
        })
    }
}

impl Default for PlazaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A relay with bound listeners and a running hub.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct PlazaServer {
    transport: WebSocketTransport,
    http: Option<TcpListener>,
    state: Arc<ServerState>,
}

impl PlazaServer {
    pub fn builder() -> PlazaServerBuilder {
        PlazaServerBuilder::new()
    }

    /// Address of the WebSocket listener.
    pub fn local_addr(&self) -> Result<SocketAddr, PlazaError> {
        Ok(self.transport.local_addr()?)
    }

    /// Address of the HTTP listener, if enabled.
    pub fn http_addr(&self) -> Option<SocketAddr> {
        self.http.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// A handle to the running hub.
    pub fn hub(&self) -> HubHandle {
        self.state.hub.clone()
    }

    /// Serves HTTP in the background and runs the WebSocket accept loop
    /// until the process is terminated.
    pub async fn run(mut self) -> Result<(), PlazaError> {
        if let Some(listener) = self.http.take() {
            let router = build_router(Arc::clone(&self.state));
            tokio::spawn(async move {
                if let Err(e) = axum::serve(listener, router).await {
                    tracing::error!(error = %e, "HTTP server failed");
                }
            });
        }

        tracing::info!(addr = ?self.transport.local_addr().ok(), "Plaza relay running");

        loop {
            match self.transport.accept().await {
                Ok(pending) => {
                    tokio::spawn(serve_connection(pending, Arc::clone(&self.state)));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Completes the handshake off the accept loop, then runs the handler.
async fn serve_connection(pending: PendingWebSocket, state: Arc<ServerState>) {
    let peer = pending.peer_addr();
    let conn = match pending.upgrade().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::debug!(%peer, error = %e, "handshake failed");
            return;
        }
    };
    if let Err(e) = handle_connection(conn, state).await {
        tracing::debug!(%peer, error = %e, "connection ended with error");
    }
}
