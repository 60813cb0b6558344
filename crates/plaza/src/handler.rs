//! Per-connection handler.
//!
//! Each accepted connection gets its own task running this handler:
//!   1. Attach an outbound channel to the hub
//!   2. Spawn a writer that encodes hub events onto the socket
//!   3. Loop: receive frames, decode, forward to the hub
//!   4. On close (or an explicit `disconnect`), detach from the hub

use std::sync::Arc;

use plaza_hub::HubHandle;
use plaza_protocol::{ClientEvent, Codec, ServerEvent, SessionId};
use plaza_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::PlazaError;
use crate::server::ServerState;

/// Drop guard that detaches the session when the handler exits.
///
/// Runs on every exit path, panics included. `Drop` is synchronous, so the
/// detach is sent from a fire-and-forget task.
struct SessionGuard {
    id: SessionId,
    hub: HubHandle,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let id = self.id;
        let hub = self.hub.clone();
        tokio::spawn(async move {
            let _ = hub.detach(id).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), PlazaError> {
    let conn = Arc::new(conn);
    let id = SessionId::from(conn.id());
    tracing::debug!(%id, peer = %conn.peer_addr(), "handling new connection");

    let (tx, rx) = mpsc::unbounded_channel();
    state.hub.attach(id, tx).await?;
    let _guard = SessionGuard {
        id,
        hub: state.hub.clone(),
    };

    let writer = tokio::spawn(write_events(Arc::clone(&conn), state.codec, id, rx));

    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%id, error = %e, "recv error");
                break;
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(%id, error = %e, "dropping malformed event");
                continue;
            }
        };

        let leaving = matches!(event, ClientEvent::Disconnect);
        state.hub.send_event(id, event).await?;
        if leaving {
            tracing::info!(%id, "client asked to disconnect");
            let _ = conn.close().await;
            break;
        }
    }

    writer.abort();
    // _guard drops here → hub detach fires.
    Ok(())
}

/// Drains the hub's outbound channel onto the socket until either side
/// goes away.
async fn write_events(
    conn: Arc<WebSocketConnection>,
    codec: impl Codec,
    id: SessionId,
    mut rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    while let Some(event) = rx.recv().await {
        let bytes = match codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%id, event = event.name(), error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%id, error = %e, "send failed, stopping writer");
            break;
        }
    }
}
