//! Session records and the partial updates applied to them.

use std::time::{Duration, Instant};

use plaza_protocol::{NearbyPlayer, Position, SenderSummary, SessionId, SessionView};

/// Where a session's display name came from.
///
/// Only generated names go back to the pool on removal; a name the client
/// chose (often a real, authenticated name) is never recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameOrigin {
    Generated,
    Client,
}

/// One connected client's presence record.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub position: Position,
    pub avatar_key: String,
    pub display_name: String,
    pub name_origin: NameOrigin,
    /// Client-asserted; nothing at this layer enforces it.
    pub authenticated: bool,
    pub auth_token: Option<String>,
    pub joined_at: Instant,
    /// Refreshed on every inbound event from this session.
    pub last_seen: Instant,
}

impl Session {
    /// The record as other clients see it.
    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            x: self.position.x,
            y: self.position.y,
            avatar_key: self.avatar_key.clone(),
            display_name: self.display_name.clone(),
            authenticated: self.authenticated,
        }
    }

    pub fn nearby_entry(&self) -> NearbyPlayer {
        NearbyPlayer {
            id: self.id,
            display_name: self.display_name.clone(),
            authenticated: self.authenticated,
            x: self.position.x,
            y: self.position.y,
        }
    }

    pub fn sender_summary(&self) -> SenderSummary {
        SenderSummary {
            id: self.id,
            display_name: self.display_name.clone(),
            authenticated: self.authenticated,
        }
    }

    /// `true` once more than `timeout` has passed since `last_seen`.
    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > timeout
    }
}

/// Fields supplied on join. Anything left `None` is defaulted by the
/// registry.
#[derive(Debug, Clone, Default)]
pub struct SessionInit {
    pub position: Option<Position>,
    pub avatar_key: Option<String>,
    pub display_name: Option<String>,
    pub authenticated: bool,
    pub auth_token: Option<String>,
}

/// A partial update. `None` means "leave this field alone".
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub position: Option<Position>,
    pub avatar_key: Option<String>,
    pub display_name: Option<String>,
    pub authenticated: Option<bool>,
    pub auth_token: Option<String>,
}

impl SessionPatch {
    /// A patch that only refreshes `last_seen`.
    pub fn touch() -> Self {
        Self::default()
    }

    pub fn position(position: Position) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }
}

/// Normalizes a client-supplied name: trimmed, and `None` when blank.
pub(crate) fn client_name(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
