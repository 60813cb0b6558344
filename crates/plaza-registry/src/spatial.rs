//! Proximity lookup behind a trait, so a grid or tree can replace the
//! linear scan without touching the registry's interface.

use std::collections::HashMap;

use plaza_protocol::{Position, SessionId};

/// Answers "which sessions are within `radius` of `center`?".
///
/// The registry keeps the index in sync: `upsert` on create and every
/// position change, `remove` on removal.
pub trait SpatialIndex: Send + 'static {
    /// Inserts a session or moves it to a new position.
    fn upsert(&mut self, id: SessionId, position: Position);

    fn remove(&mut self, id: SessionId);

    /// Ids whose Euclidean distance to `center` is `<= radius`, in no
    /// particular order.
    fn query(&self, center: Position, radius: f64) -> Vec<SessionId>;
}

/// O(n) scan over every indexed point. Fine for tens to low hundreds of
/// sessions.
#[derive(Debug, Default)]
pub struct LinearIndex {
    points: HashMap<SessionId, Position>,
}

impl LinearIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl SpatialIndex for LinearIndex {
    fn upsert(&mut self, id: SessionId, position: Position) {
        self.points.insert(id, position);
    }

    fn remove(&mut self, id: SessionId) {
        self.points.remove(&id);
    }

    fn query(&self, center: Position, radius: f64) -> Vec<SessionId> {
        self.points
            .iter()
            .filter(|(_, p)| p.distance_to(center) <= radius)
            .map(|(id, _)| *id)
            .collect()
    }
}
