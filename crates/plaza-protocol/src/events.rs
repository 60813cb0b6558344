//! Inbound and outbound presence events.
//!
//! Every frame is one JSON object, internally tagged by `type`:
//!
//! ```text
//! {"type":"move","x":10.5,"y":20,"avatarKey":"avatar-left"}
//! {"type":"left","id":7}
//! ```
//!
//! Event names are kebab-case and field names camelCase, which is what the
//! browser client already speaks.

use serde::{Deserialize, Serialize};

use crate::{Position, ProtocolError, SessionId};

// ---------------------------------------------------------------------------
// Snapshot shapes embedded in outbound events
// ---------------------------------------------------------------------------

/// The public view of a session, as other clients see it.
///
/// The auth token is never included: it belongs to the owning client only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: SessionId,
    pub x: f64,
    pub y: f64,
    pub avatar_key: String,
    pub display_name: String,
    pub authenticated: bool,
}

/// One entry of a `nearby` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyPlayer {
    pub id: SessionId,
    pub display_name: String,
    pub authenticated: bool,
    pub x: f64,
    pub y: f64,
}

/// Who sent a payment notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderSummary {
    pub id: SessionId,
    pub display_name: String,
    pub authenticated: bool,
}

// ---------------------------------------------------------------------------
// ClientEvent: browser → relay
// ---------------------------------------------------------------------------

/// Everything a client may send.
///
/// Unknown `type` values decode to [`ClientEvent::Unknown`] so they can be
/// ignored quietly; a known type with missing or mistyped fields fails to
/// decode and is treated as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Enter the world. Everything is optional; the registry fills in the
    /// spawn point, default avatar, and a generated name.
    Join {
        x: Option<f64>,
        y: Option<f64>,
        avatar_key: Option<String>,
        display_name: Option<String>,
        #[serde(default)]
        authenticated: bool,
        auth_token: Option<String>,
    },

    Move {
        x: f64,
        y: f64,
        avatar_key: Option<String>,
    },

    AuthUpdate {
        authenticated: bool,
        auth_token: Option<String>,
        display_name: Option<String>,
    },

    /// Who is within the proximity radius of `(x, y)`?
    ProximityQuery { x: f64, y: f64 },

    DirectMessage { target_id: SessionId, body: String },

    TypingState { target_id: SessionId, is_typing: bool },

    /// Relayed verbatim; the amount is never interpreted.
    PaymentNotify {
        target_id: SessionId,
        amount: f64,
        currency: String,
        #[serde(default)]
        body: String,
    },

    /// Room-wide chat line.
    Chat { body: String },

    LivenessPing,

    /// Explicit leave. Handled exactly like a transport close.
    Disconnect,

    #[serde(other)]
    Unknown,
}

impl ClientEvent {
    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Move { .. } => "move",
            Self::AuthUpdate { .. } => "auth-update",
            Self::ProximityQuery { .. } => "proximity-query",
            Self::DirectMessage { .. } => "direct-message",
            Self::TypingState { .. } => "typing-state",
            Self::PaymentNotify { .. } => "payment-notify",
            Self::Chat { .. } => "chat",
            Self::LivenessPing => "liveness-ping",
            Self::Disconnect => "disconnect",
            Self::Unknown => "unknown",
        }
    }

    /// Checks rules that serde can't express.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] if a coordinate is NaN or
    /// infinite.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let coords = match self {
            Self::Move { x, y, .. } | Self::ProximityQuery { x, y } => Some(Position::new(*x, *y)),
            Self::Join { x, y, .. } => {
                // Missing coordinates are fine; present ones must be finite.
                Some(Position::new(x.unwrap_or(0.0), y.unwrap_or(0.0)))
            }
            _ => None,
        };
        match coords {
            Some(p) if !p.is_finite() => Err(ProtocolError::InvalidMessage(format!(
                "{} carries a non-finite coordinate",
                self.name()
            ))),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerEvent: relay → browser
// ---------------------------------------------------------------------------

/// Everything the relay may send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Your own record, sent once after join.
    Assigned(SessionView),

    /// Everyone else who is already here, sent once after join.
    Roster { players: Vec<SessionView> },

    /// Someone new arrived.
    Joined(SessionView),

    Moved {
        id: SessionId,
        x: f64,
        y: f64,
        avatar_key: String,
        display_name: String,
        authenticated: bool,
        timestamp: u64,
    },

    /// Confirms the sender's own move was applied.
    PositionAck { x: f64, y: f64, timestamp: u64 },

    PlayerUpdated {
        id: SessionId,
        display_name: String,
        authenticated: bool,
    },

    Left { id: SessionId },

    Nearby { players: Vec<NearbyPlayer> },

    DirectMessage {
        from_id: SessionId,
        from_display_name: String,
        body: String,
        timestamp: u64,
    },

    Typing {
        from_id: SessionId,
        from_display_name: String,
    },

    TypingStopped {
        from_id: SessionId,
        from_display_name: String,
    },

    PaymentReceived {
        from: SenderSummary,
        amount: f64,
        currency: String,
        body: String,
        timestamp: u64,
    },

    ChatMessage {
        from_id: SessionId,
        from_display_name: String,
        body: String,
        authenticated: bool,
        timestamp: u64,
    },

    LivenessPong { server_time: u64 },
}

impl ServerEvent {
    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Assigned(_) => "assigned",
            Self::Roster { .. } => "roster",
            Self::Joined(_) => "joined",
            Self::Moved { .. } => "moved",
            Self::PositionAck { .. } => "position-ack",
            Self::PlayerUpdated { .. } => "player-updated",
            Self::Left { .. } => "left",
            Self::Nearby { .. } => "nearby",
            Self::DirectMessage { .. } => "direct-message",
            Self::Typing { .. } => "typing",
            Self::TypingStopped { .. } => "typing-stopped",
            Self::PaymentReceived { .. } => "payment-received",
            Self::ChatMessage { .. } => "chat-message",
            Self::LivenessPong { .. } => "liveness-pong",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: u64) -> SessionView {
        SessionView {
            id: SessionId(id),
            x: 1920.0,
            y: 1280.0,
            avatar_key: "avatar-front".into(),
            display_name: "Nomad42".into(),
            authenticated: false,
        }
    }

    // =====================================================================
    // ClientEvent decoding
    // =====================================================================

    #[test]
    fn test_join_with_all_fields_omitted_decodes() {
        let ev: ClientEvent = serde_json::from_str(r#"{"type":"join"}"#).unwrap();
        assert_eq!(
            ev,
            ClientEvent::Join {
                x: None,
                y: None,
                avatar_key: None,
                display_name: None,
                authenticated: false,
                auth_token: None,
            }
        );
    }

    #[test]
    fn test_join_uses_camel_case_fields() {
        let ev: ClientEvent = serde_json::from_str(
            r#"{"type":"join","x":5,"y":6,"avatarKey":"cat","displayName":"Ada",
                "authenticated":true,"authToken":"tok"}"#,
        )
        .unwrap();
        match ev {
            ClientEvent::Join {
                x,
                avatar_key,
                display_name,
                authenticated,
                auth_token,
                ..
            } => {
                assert_eq!(x, Some(5.0));
                assert_eq!(avatar_key.as_deref(), Some("cat"));
                assert_eq!(display_name.as_deref(), Some("Ada"));
                assert!(authenticated);
                assert_eq!(auth_token.as_deref(), Some("tok"));
            }
            other => panic!("expected Join, got {other:?}"),
        }
    }

    #[test]
    fn test_kebab_case_event_names() {
        let ev: ClientEvent =
            serde_json::from_str(r#"{"type":"typing-state","targetId":4,"isTyping":true}"#)
                .unwrap();
        assert_eq!(
            ev,
            ClientEvent::TypingState {
                target_id: SessionId(4),
                is_typing: true
            }
        );

        let ev: ClientEvent = serde_json::from_str(r#"{"type":"liveness-ping"}"#).unwrap();
        assert_eq!(ev, ClientEvent::LivenessPing);
    }

    #[test]
    fn test_unknown_event_type_decodes_to_unknown() {
        let ev: ClientEvent =
            serde_json::from_str(r#"{"type":"fly-to-moon","speed":9000}"#).unwrap();
        assert_eq!(ev, ClientEvent::Unknown);
    }

    #[test]
    fn test_move_with_string_coordinate_fails_to_decode() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"type":"move","x":"abc","y":5}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_direct_message_missing_body_fails_to_decode() {
        let result: Result<ClientEvent, _> =
            serde_json::from_str(r#"{"type":"direct-message","targetId":2}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_payment_notify_body_defaults_to_empty() {
        let ev: ClientEvent = serde_json::from_str(
            r#"{"type":"payment-notify","targetId":2,"amount":5.5,"currency":"USD"}"#,
        )
        .unwrap();
        assert!(matches!(ev, ClientEvent::PaymentNotify { ref body, .. } if body.is_empty()));
    }

    #[test]
    fn test_missing_type_tag_fails_to_decode() {
        let result: Result<ClientEvent, _> = serde_json::from_str(r#"{"x":1,"y":2}"#);
        assert!(result.is_err());
    }

    // =====================================================================
    // ClientEvent validation
    // =====================================================================

    #[test]
    fn test_validate_rejects_non_finite_move() {
        let ev = ClientEvent::Move {
            x: f64::NAN,
            y: 1.0,
            avatar_key: None,
        };
        assert!(matches!(ev.validate(), Err(ProtocolError::InvalidMessage(_))));
    }

    #[test]
    fn test_validate_rejects_infinite_join_coordinate() {
        let ev = ClientEvent::Join {
            x: Some(f64::INFINITY),
            y: None,
            avatar_key: None,
            display_name: None,
            authenticated: false,
            auth_token: None,
        };
        assert!(ev.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_ordinary_events() {
        assert!(ClientEvent::ProximityQuery { x: 1.0, y: 2.0 }.validate().is_ok());
        assert!(ClientEvent::LivenessPing.validate().is_ok());
        assert!(
            ClientEvent::Chat {
                body: "hello".into()
            }
            .validate()
            .is_ok()
        );
    }

    // =====================================================================
    // ServerEvent JSON shapes
    // =====================================================================

    #[test]
    fn test_assigned_flattens_session_fields() {
        let json = serde_json::to_value(ServerEvent::Assigned(view(1))).unwrap();
        assert_eq!(json["type"], "assigned");
        assert_eq!(json["id"], 1);
        assert_eq!(json["displayName"], "Nomad42");
        assert_eq!(json["avatarKey"], "avatar-front");
        assert!(json.get("authToken").is_none());
    }

    #[test]
    fn test_roster_carries_player_list() {
        let json = serde_json::to_value(ServerEvent::Roster {
            players: vec![view(1), view(2)],
        })
        .unwrap();
        assert_eq!(json["type"], "roster");
        assert_eq!(json["players"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_direct_message_field_names() {
        let json = serde_json::to_value(ServerEvent::DirectMessage {
            from_id: SessionId(1),
            from_display_name: "Ada".into(),
            body: "hi".into(),
            timestamp: 10,
        })
        .unwrap();
        assert_eq!(json["type"], "direct-message");
        assert_eq!(json["fromId"], 1);
        assert_eq!(json["fromDisplayName"], "Ada");
        assert_eq!(json["body"], "hi");
    }

    #[test]
    fn test_server_event_name_matches_wire_tag() {
        let events = [
            ServerEvent::Left { id: SessionId(4) },
            ServerEvent::PositionAck { x: 1.0, y: 2.0, timestamp: 3 },
            ServerEvent::LivenessPong { server_time: 5 },
            ServerEvent::Nearby { players: vec![] },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.name());
        }
    }

    #[test]
    fn test_typing_stopped_and_liveness_pong_names() {
        let json = serde_json::to_value(ServerEvent::TypingStopped {
            from_id: SessionId(1),
            from_display_name: "Ada".into(),
        })
        .unwrap();
        assert_eq!(json["type"], "typing-stopped");

        let json = serde_json::to_value(ServerEvent::LivenessPong { server_time: 5 }).unwrap();
        assert_eq!(json["type"], "liveness-pong");
        assert_eq!(json["serverTime"], 5);
    }

    #[test]
    fn test_payment_received_nests_sender() {
        let json = serde_json::to_value(ServerEvent::PaymentReceived {
            from: SenderSummary {
                id: SessionId(3),
                display_name: "Ada".into(),
                authenticated: true,
            },
            amount: 2.5,
            currency: "USD".into(),
            body: "thanks".into(),
            timestamp: 1,
        })
        .unwrap();
        assert_eq!(json["type"], "payment-received");
        assert_eq!(json["from"]["id"], 3);
        assert_eq!(json["from"]["displayName"], "Ada");
        assert_eq!(json["amount"], 2.5);
    }

    #[test]
    fn test_server_event_decodes_back_for_clients() {
        let json = r#"{"type":"joined","id":2,"x":1.0,"y":2.0,"avatarKey":"a",
                       "displayName":"B","authenticated":false}"#;
        let ev: ServerEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(ev, ServerEvent::Joined(v) if v.id == SessionId(2)));
    }
}
