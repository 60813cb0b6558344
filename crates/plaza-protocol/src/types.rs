//! Identity, geometry, and routing types shared by every layer.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use plaza_transport::ConnectionId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Identifier of one connected client, stable for the connection's lifetime.
///
/// The transport assigns it on accept; see the `From<ConnectionId>` impl.
/// Serialized as a bare number so browser clients can use it as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl From<ConnectionId> for SessionId {
    fn from(id: ConnectionId) -> Self {
        Self(id.into_inner())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// `true` when both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who should receive an outbound event.
///
/// The hub pairs every [`ServerEvent`](crate::ServerEvent) it produces with
/// one of these; the dispatcher resolves it against the live session set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every joined session, the originator included.
    All,

    /// Every joined session except the given one.
    AllExcept(SessionId),

    /// Exactly one session. Silently dropped if it is gone.
    Session(SessionId),
}

/// Milliseconds since the Unix epoch, used for event timestamps.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_serializes_as_plain_number() {
        assert_eq!(serde_json::to_string(&SessionId(42)).unwrap(), "42");
        let id: SessionId = serde_json::from_str("42").unwrap();
        assert_eq!(id, SessionId(42));
    }

    #[test]
    fn test_session_id_display() {
        assert_eq!(SessionId(7).to_string(), "S-7");
    }

    #[test]
    fn test_session_id_from_connection_id() {
        assert_eq!(SessionId::from(ConnectionId::new(9)), SessionId(9));
    }

    #[test]
    fn test_distance_to_matches_pythagoras() {
        let a = Position::new(100.0, 100.0);
        let b = Position::new(150.0, 120.0);
        let d = a.distance_to(b);
        assert!((d - 53.851_648).abs() < 1e-5, "got {d}");
        assert_eq!(a.distance_to(a), 0.0);
    }

    #[test]
    fn test_is_finite_rejects_nan_and_infinity() {
        assert!(Position::new(1.0, -2.5).is_finite());
        assert!(!Position::new(f64::NAN, 0.0).is_finite());
        assert!(!Position::new(0.0, f64::INFINITY).is_finite());
    }

    #[test]
    fn test_unix_millis_is_after_2020() {
        assert!(unix_millis() > 1_577_836_800_000);
    }
}
