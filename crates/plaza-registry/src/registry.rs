//! The session registry: every live session, keyed by id.
//!
//! # Concurrency note
//!
//! `SessionRegistry` has no locking of its own. The hub owns it inside a
//! single actor task, so joins, updates, removals and sweeps are applied
//! one at a time in mailbox order.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use plaza_protocol::{Position, SessionId};

use crate::session::client_name;
use crate::{
    LinearIndex, NameConfig, NameOrigin, NamePool, RegistryError, Session, SessionInit,
    SessionPatch, SpatialIndex,
};

/// Defaults applied when a join omits fields.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Where sessions appear when the join carries no coordinates.
    pub spawn: Position,
    pub default_avatar: String,
    pub names: NameConfig,
    /// Fixed RNG seed for name generation. `None` seeds from the OS.
    pub name_seed: Option<u64>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            spawn: Position::new(1920.0, 1280.0),
            default_avatar: "avatar-front".to_string(),
            names: NameConfig::default(),
            name_seed: None,
        }
    }
}

/// In-memory table of live sessions.
///
/// ## Lifecycle
///
/// ```text
/// create() ──→ update()* ──→ remove()
///                  │
///                  └──────→ sweep_expired()   (no event for `timeout`)
/// ```
///
/// The spatial index is generic so the linear scan can be swapped for a
/// grid without changing any caller.
pub struct SessionRegistry<I: SpatialIndex = LinearIndex> {
    sessions: HashMap<SessionId, Session>,
    index: I,
    names: NamePool,
    config: RegistryConfig,
}

impl SessionRegistry<LinearIndex> {
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_index(config, LinearIndex::new())
    }
}

impl Default for SessionRegistry<LinearIndex> {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl<I: SpatialIndex> SessionRegistry<I> {
    /// Creates a registry backed by a custom spatial index.
    pub fn with_index(config: RegistryConfig, index: I) -> Self {
        let names = match config.name_seed {
            Some(seed) => NamePool::with_seed(config.names.clone(), seed),
            None => NamePool::new(config.names.clone()),
        };
        Self {
            sessions: HashMap::new(),
            index,
            names,
            config,
        }
    }

    /// Creates the session for `id`, or merges `init` into it if it
    /// already exists.
    ///
    /// A re-join is not an error: supplied fields overwrite, missing ones
    /// keep their current values, and an assigned display name is kept.
    pub fn create(&mut self, id: SessionId, init: SessionInit, now: Instant) -> &Session {
        if self.sessions.contains_key(&id) {
            tracing::debug!(%id, "re-join, merging into existing session");
            let patch = SessionPatch {
                position: init.position,
                avatar_key: init.avatar_key,
                display_name: None,
                authenticated: Some(init.authenticated),
                auth_token: init.auth_token,
            };
            return self.apply(id, patch, now).expect("checked above");
        }

        let (display_name, name_origin) = match client_name(init.display_name) {
            Some(name) => (name, NameOrigin::Client),
            None => (self.names.generate(), NameOrigin::Generated),
        };
        let position = init.position.unwrap_or(self.config.spawn);

        let session = Session {
            id,
            position,
            avatar_key: init
                .avatar_key
                .unwrap_or_else(|| self.config.default_avatar.clone()),
            display_name,
            name_origin,
            authenticated: init.authenticated,
            auth_token: init.auth_token,
            joined_at: now,
            last_seen: now,
        };

        self.index.upsert(id, position);
        self.sessions.insert(id, session);
        tracing::info!(%id, live = self.sessions.len(), "session created");

        self.sessions.get(&id).expect("just inserted")
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    /// Merges `patch` into the session and refreshes `last_seen`.
    ///
    /// A new display name replaces the old one and marks the name as
    /// client-chosen; a generated name it replaces goes back to the pool.
    ///
    /// # Errors
    /// [`RegistryError::NotFound`] if no live session has this id.
    pub fn update(
        &mut self,
        id: SessionId,
        patch: SessionPatch,
        now: Instant,
    ) -> Result<&Session, RegistryError> {
        self.apply(id, patch, now)
    }

    fn apply(
        &mut self,
        id: SessionId,
        patch: SessionPatch,
        now: Instant,
    ) -> Result<&Session, RegistryError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(RegistryError::NotFound(id))?;

        if let Some(position) = patch.position {
            session.position = position;
            self.index.upsert(id, position);
        }
        if let Some(avatar_key) = patch.avatar_key {
            session.avatar_key = avatar_key;
        }
        if let Some(authenticated) = patch.authenticated {
            session.authenticated = authenticated;
        }
        if let Some(token) = patch.auth_token {
            session.auth_token = Some(token);
        }
        if let Some(name) = client_name(patch.display_name) {
            if name != session.display_name {
                if session.name_origin == NameOrigin::Generated {
                    self.names.release(&session.display_name);
                }
                session.display_name = name;
                session.name_origin = NameOrigin::Client;
            }
        }
        session.last_seen = now;

        Ok(session)
    }

    /// Removes the session and releases its name if it was generated.
    ///
    /// # Errors
    /// [`RegistryError::NotFound`] if the session is already gone, so a
    /// disconnect racing a sweep releases the name only once.
    pub fn remove(&mut self, id: SessionId) -> Result<Session, RegistryError> {
        let session = self
            .sessions
            .remove(&id)
            .ok_or(RegistryError::NotFound(id))?;

        self.index.remove(id);
        if session.name_origin == NameOrigin::Generated {
            self.names.release(&session.display_name);
        }
        tracing::info!(%id, live = self.sessions.len(), "session removed");

        Ok(session)
    }

    /// Snapshot of every session except `exclude`.
    pub fn all_others(&self, exclude: SessionId) -> Vec<&Session> {
        self.sessions
            .values()
            .filter(|s| s.id != exclude)
            .collect()
    }

    /// Sessions within `radius` of `center` (inclusive), except `exclude`,
    /// ordered by id.
    pub fn within(&self, center: Position, radius: f64, exclude: SessionId) -> Vec<&Session> {
        let mut hits: Vec<&Session> = self
            .index
            .query(center, radius)
            .into_iter()
            .filter(|id| *id != exclude)
            .filter_map(|id| self.sessions.get(&id))
            .collect();
        hits.sort_by_key(|s| s.id);
        hits
    }

    /// Removes every session idle for more than `timeout` and returns
    /// their ids in ascending order.
    ///
    /// Each removal stands alone: one failure is logged and the sweep
    /// carries on with the rest.
    pub fn sweep_expired(&mut self, now: Instant, timeout: Duration) -> Vec<SessionId> {
        let mut stale: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|s| s.is_expired(now, timeout))
            .map(|s| s.id)
            .collect();
        stale.sort();

        let mut removed = Vec::with_capacity(stale.len());
        for id in stale {
            match self.remove(id) {
                Ok(_) => removed.push(id),
                Err(e) => tracing::warn!(%id, error = %e, "sweep could not remove session"),
            }
        }

        if !removed.is_empty() {
            tracing::info!(count = removed.len(), "swept idle sessions");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Iterates over live sessions in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Whether a generated name is currently held by a live session.
    pub fn is_name_reserved(&self, name: &str) -> bool {
        self.names.is_reserved(name)
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}
