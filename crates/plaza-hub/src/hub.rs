//! Hub actor: one Tokio task that owns the session registry.
//!
//! Connection handlers never touch the registry. They send commands
//! through the hub's mailbox, and the actor applies them one at a time,
//! interleaved with the periodic liveness sweep. Per-connection order is
//! the order a handler sent its commands, so a `move` followed by a
//! `disconnect` can never resurrect the session.

use std::collections::HashMap;
use std::time::Duration;

use plaza_protocol::{ClientEvent, Position, Recipient, ServerEvent, SessionId, unix_millis};
use plaza_registry::{Session, SessionInit, SessionPatch, SessionRegistry};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};

use crate::{HubConfig, HubError};

/// Channel for delivering outbound events to one connection.
pub type SessionSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to the hub actor.
pub(crate) enum HubCommand {
    /// A transport connection opened. No registry record exists yet.
    Attach { id: SessionId, sender: SessionSender },

    /// A decoded inbound event from a connection.
    Event { id: SessionId, event: ClientEvent },

    /// The transport connection closed. Idempotent.
    Detach { id: SessionId },

    Players { reply: oneshot::Sender<Vec<PlayerSnapshot>> },

    Stats { reply: oneshot::Sender<HubStats> },

    Shutdown,
}

/// One live session as reported by the roster endpoint.
#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub id: SessionId,
    pub display_name: String,
    pub position: Position,
    pub authenticated: bool,
    /// Time since the last inbound event.
    pub idle: Duration,
}

/// Counters for the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStats {
    /// Sessions that have joined and not yet left.
    pub sessions: usize,
    /// Open transport connections, joined or not.
    pub connections: usize,
}

/// Handle to the running hub. Cheap to clone.
#[derive(Clone)]
pub struct HubHandle {
    sender: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Registers a connection's outbound channel.
    pub async fn attach(&self, id: SessionId, sender: SessionSender) -> Result<(), HubError> {
        self.send(HubCommand::Attach { id, sender }).await
    }

    /// Delivers an inbound event (fire-and-forget).
    pub async fn send_event(&self, id: SessionId, event: ClientEvent) -> Result<(), HubError> {
        self.send(HubCommand::Event { id, event }).await
    }

    /// Reports that a connection closed.
    pub async fn detach(&self, id: SessionId) -> Result<(), HubError> {
        self.send(HubCommand::Detach { id }).await
    }

    /// Snapshot of every live session, ordered by id.
    pub async fn players(&self) -> Result<Vec<PlayerSnapshot>, HubError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Players { reply }).await?;
        rx.await.map_err(|_| HubError::Unavailable)
    }

    pub async fn stats(&self) -> Result<HubStats, HubError> {
        let (reply, rx) = oneshot::channel();
        self.send(HubCommand::Stats { reply }).await?;
        rx.await.map_err(|_| HubError::Unavailable)
    }

    /// Stops the actor. Commands already queued ahead of this are handled.
    pub async fn shutdown(&self) -> Result<(), HubError> {
        self.send(HubCommand::Shutdown).await
    }

    async fn send(&self, cmd: HubCommand) -> Result<(), HubError> {
        self.sender.send(cmd).await.map_err(|_| HubError::Unavailable)
    }
}

/// Registry time, read from Tokio's clock so paused-time tests drive it.
fn now() -> std::time::Instant {
    Instant::now().into_std()
}

struct HubActor {
    config: HubConfig,
    registry: SessionRegistry,
    senders: HashMap<SessionId, SessionSender>,
    receiver: mpsc::Receiver<HubCommand>,
}

impl HubActor {
    async fn run(mut self) {
        tracing::info!(
            radius = self.config.proximity_radius,
            sweep_secs = self.config.sweep_interval.as_secs(),
            timeout_secs = self.config.session_timeout.as_secs(),
            "presence hub started"
        );

        let period = self.config.sweep_interval;
        let mut sweep = tokio::time::interval_at(Instant::now() + period, period);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                _ = sweep.tick() => self.sweep(),
            }
        }

        tracing::info!("presence hub stopped");
    }

    /// Returns `false` when the actor should stop.
    fn handle_command(&mut self, cmd: HubCommand) -> bool {
        match cmd {
            HubCommand::Attach { id, sender } => {
                if self.senders.insert(id, sender).is_some() {
                    tracing::debug!(%id, "connection re-attached");
                }
            }
            HubCommand::Event { id, event } => self.handle_event(id, event),
            HubCommand::Detach { id } => {
                self.senders.remove(&id);
                self.remove_session(id, "connection closed");
            }
            HubCommand::Players { reply } => {
                let _ = reply.send(self.players());
            }
            HubCommand::Stats { reply } => {
                let _ = reply.send(HubStats {
                    sessions: self.registry.len(),
                    connections: self.senders.len(),
                });
            }
            HubCommand::Shutdown => {
                tracing::info!("presence hub shutting down");
                return false;
            }
        }
        true
    }

    fn handle_event(&mut self, id: SessionId, event: ClientEvent) {
        if let Err(e) = event.validate() {
            tracing::warn!(%id, event = event.name(), error = %e, "dropping invalid event");
            return;
        }
        let now = now();

        match event {
            ClientEvent::Join {
                x,
                y,
                avatar_key,
                display_name,
                authenticated,
                auth_token,
            } => {
                let init = SessionInit {
                    position: self.join_position(x, y),
                    avatar_key,
                    display_name,
                    authenticated,
                    auth_token,
                };
                self.handle_join(id, init, now);
            }
            ClientEvent::LivenessPing => {
                let _ = self.registry.update(id, SessionPatch::touch(), now);
                self.send_to(id, ServerEvent::LivenessPong { server_time: unix_millis() });
            }
            ClientEvent::Disconnect => self.remove_session(id, "client disconnect"),
            ClientEvent::Unknown => {
                self.touch(id, now);
                tracing::debug!(%id, "ignoring unknown event");
            }
            event => {
                if !self.registry.contains(id) {
                    tracing::debug!(%id, event = event.name(), "event before join, ignoring");
                    return;
                }
                self.handle_joined_event(id, event, now);
            }
        }
    }

    /// Missing coordinates fall back to the spawn point one axis at a time.
    fn join_position(&self, x: Option<f64>, y: Option<f64>) -> Option<Position> {
        if x.is_none() && y.is_none() {
            return None;
        }
        let spawn = self.registry.config().spawn;
        Some(Position::new(x.unwrap_or(spawn.x), y.unwrap_or(spawn.y)))
    }

    /// A first join announces the session with `joined`. A re-join is an
    /// update, so the others get `moved` carrying the merged state.
    fn handle_join(&mut self, id: SessionId, init: SessionInit, now: std::time::Instant) {
        let rejoin = self.registry.contains(id);
        let view = self.registry.create(id, init, now).view();
        let roster = self
            .registry
            .all_others(id)
            .into_iter()
            .map(Session::view)
            .collect();

        self.dispatch(Recipient::Session(id), ServerEvent::Assigned(view.clone()));
        self.dispatch(Recipient::Session(id), ServerEvent::Roster { players: roster });

        if rejoin {
            tracing::debug!(%id, name = %view.display_name, "session re-joined");
            let moved = ServerEvent::Moved {
                id,
                x: view.x,
                y: view.y,
                avatar_key: view.avatar_key,
                display_name: view.display_name,
                authenticated: view.authenticated,
                timestamp: unix_millis(),
            };
            self.dispatch(Recipient::AllExcept(id), moved);
        } else {
            tracing::info!(%id, name = %view.display_name, live = self.registry.len(), "session joined");
            self.dispatch(Recipient::AllExcept(id), ServerEvent::Joined(view));
        }
    }

    fn handle_joined_event(&mut self, id: SessionId, event: ClientEvent, now: std::time::Instant) {
        match event {
            ClientEvent::Move { x, y, avatar_key } => {
                let patch = SessionPatch {
                    position: Some(Position::new(x, y)),
                    avatar_key,
                    ..SessionPatch::default()
                };
                let Ok(s) = self.registry.update(id, patch, now) else { return };
                let moved = ServerEvent::Moved {
                    id,
                    x,
                    y,
                    avatar_key: s.avatar_key.clone(),
                    display_name: s.display_name.clone(),
                    authenticated: s.authenticated,
                    timestamp: unix_millis(),
                };
                self.dispatch(Recipient::AllExcept(id), moved);
                self.dispatch(
                    Recipient::Session(id),
                    ServerEvent::PositionAck { x, y, timestamp: unix_millis() },
                );
            }
            ClientEvent::AuthUpdate {
                authenticated,
                auth_token,
                display_name,
            } => {
                let patch = SessionPatch {
                    authenticated: Some(authenticated),
                    auth_token,
                    display_name,
                    ..SessionPatch::default()
                };
                let Ok(s) = self.registry.update(id, patch, now) else { return };
                let updated = ServerEvent::PlayerUpdated {
                    id,
                    display_name: s.display_name.clone(),
                    authenticated: s.authenticated,
                };
                tracing::info!(%id, authenticated, "session auth updated");
                self.dispatch(Recipient::All, updated);
            }
            ClientEvent::ProximityQuery { x, y } => {
                self.touch(id, now);
                let players = self
                    .registry
                    .within(Position::new(x, y), self.config.proximity_radius, id)
                    .into_iter()
                    .map(Session::nearby_entry)
                    .collect::<Vec<_>>();
                tracing::debug!(%id, found = players.len(), "proximity query");
                self.dispatch(Recipient::Session(id), ServerEvent::Nearby { players });
            }
            ClientEvent::DirectMessage { target_id, body } => {
                let Some(from) = self.touch(id, now) else { return };
                self.unicast(
                    target_id,
                    ServerEvent::DirectMessage {
                        from_id: id,
                        from_display_name: from.display_name,
                        body,
                        timestamp: unix_millis(),
                    },
                );
            }
            ClientEvent::TypingState { target_id, is_typing } => {
                let Some(from) = self.touch(id, now) else { return };
                let event = if is_typing {
                    ServerEvent::Typing {
                        from_id: id,
                        from_display_name: from.display_name,
                    }
                } else {
                    ServerEvent::TypingStopped {
                        from_id: id,
                        from_display_name: from.display_name,
                    }
                };
                self.unicast(target_id, event);
            }
            ClientEvent::PaymentNotify {
                target_id,
                amount,
                currency,
                body,
            } => {
                let Some(from) = self.touch(id, now) else { return };
                self.unicast(
                    target_id,
                    ServerEvent::PaymentReceived {
                        from: from.sender_summary(),
                        amount,
                        currency,
                        body,
                        timestamp: unix_millis(),
                    },
                );
            }
            ClientEvent::Chat { body } => {
                let Some(from) = self.touch(id, now) else { return };
                self.dispatch(
                    Recipient::All,
                    ServerEvent::ChatMessage {
                        from_id: id,
                        from_display_name: from.display_name,
                        body,
                        authenticated: from.authenticated,
                        timestamp: unix_millis(),
                    },
                );
            }
            other => {
                tracing::debug!(%id, event = other.name(), "unhandled event");
            }
        }
    }

    /// Refreshes `last_seen` and returns a copy of the sender's record.
    fn touch(&mut self, id: SessionId, now: std::time::Instant) -> Option<Session> {
        self.registry.update(id, SessionPatch::touch(), now).ok().cloned()
    }

    /// Sends to one joined session, or drops silently if it is gone.
    fn unicast(&self, target: SessionId, event: ServerEvent) {
        if !self.registry.contains(target) {
            tracing::debug!(%target, event = event.name(), "unicast target not found, dropping");
            return;
        }
        self.dispatch(Recipient::Session(target), event);
    }

    fn remove_session(&mut self, id: SessionId, reason: &'static str) {
        match self.registry.remove(id) {
            Ok(session) => {
                tracing::info!(%id, name = %session.display_name, reason, "session left");
                self.dispatch(Recipient::All, ServerEvent::Left { id });
            }
            Err(_) => tracing::debug!(%id, reason, "no live session to remove"),
        }
    }

    fn sweep(&mut self) {
        let removed = self.registry.sweep_expired(now(), self.config.session_timeout);
        for id in removed {
            tracing::info!(%id, "session expired");
            self.dispatch(Recipient::All, ServerEvent::Left { id });
        }
    }

    fn players(&self) -> Vec<PlayerSnapshot> {
        let now = now();
        let mut players: Vec<PlayerSnapshot> = self
            .registry
            .iter()
            .map(|s| PlayerSnapshot {
                id: s.id,
                display_name: s.display_name.clone(),
                position: s.position,
                authenticated: s.authenticated,
                idle: now.saturating_duration_since(s.last_seen),
            })
            .collect();
        players.sort_by_key(|p| p.id);
        players
    }

    /// Resolves `recipient` against the joined sessions and queues the
    /// event on each one's channel.
    fn dispatch(&self, recipient: Recipient, event: ServerEvent) {
        match recipient {
            Recipient::All => {
                for session in self.registry.iter() {
                    self.send_to(session.id, event.clone());
                }
            }
            Recipient::AllExcept(excluded) => {
                for session in self.registry.iter() {
                    if session.id != excluded {
                        self.send_to(session.id, event.clone());
                    }
                }
            }
            Recipient::Session(id) => self.send_to(id, event),
        }
    }

    /// Drops the event if the connection's receiver is gone.
    fn send_to(&self, id: SessionId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&id) {
            let _ = sender.send(event);
        }
    }
}

/// Spawns the hub actor and returns a handle to it.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_hub(config: HubConfig) -> HubHandle {
    let config = config.validated();
    let (tx, rx) = mpsc::channel(config.mailbox_capacity);

    let actor = HubActor {
        registry: SessionRegistry::new(config.registry.clone()),
        config,
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    HubHandle { sender: tx }
}
