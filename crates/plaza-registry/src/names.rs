//! Display-name generation for anonymous sessions.
//!
//! A generated name is a base name from a fixed pool plus a random numeric
//! suffix (`Explorer4821`). While its owner is live the name is reserved;
//! the pool retries on collision a bounded number of times and then accepts
//! a duplicate rather than failing the join.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Base names used when no custom pool is configured.
pub const DEFAULT_BASE_NAMES: [&str; 10] = [
    "Explorer",
    "Adventurer",
    "Wanderer",
    "Traveler",
    "Seeker",
    "Navigator",
    "Pioneer",
    "Voyager",
    "Nomad",
    "Pathfinder",
];

/// Configuration for the name pool.
#[derive(Debug, Clone)]
pub struct NameConfig {
    /// Base names drawn uniformly.
    pub base_names: Vec<String>,
    /// Suffixes are drawn from `0..suffix_range`.
    pub suffix_range: u32,
    /// Attempts to find an unreserved name before accepting a collision.
    pub max_attempts: u32,
}

impl Default for NameConfig {
    fn default() -> Self {
        Self {
            base_names: DEFAULT_BASE_NAMES.iter().map(|s| s.to_string()).collect(),
            suffix_range: 9999,
            max_attempts: 50,
        }
    }
}

impl NameConfig {
    /// Replaces values that would make generation impossible.
    ///
    /// - An empty `base_names` falls back to [`DEFAULT_BASE_NAMES`].
    /// - `suffix_range` and `max_attempts` are raised to at least 1.
    pub fn validated(mut self) -> Self {
        if self.base_names.is_empty() {
            tracing::warn!("empty base name pool, using defaults");
            self.base_names = DEFAULT_BASE_NAMES.iter().map(|s| s.to_string()).collect();
        }
        self.suffix_range = self.suffix_range.max(1);
        self.max_attempts = self.max_attempts.max(1);
        self
    }
}

/// Generates display names and tracks which generated names are in use.
///
/// Reservations are counted, not flagged: once the pool has degraded into
/// handing out a duplicate, releasing one holder must not free the name
/// while the other still has it.
pub struct NamePool {
    config: NameConfig,
    reserved: HashMap<String, usize>,
    rng: StdRng,
}

impl NamePool {
    /// Creates a pool seeded from the operating system.
    pub fn new(config: NameConfig) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Creates a pool with a fixed seed, for reproducible tests.
    pub fn with_seed(config: NameConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: NameConfig, rng: StdRng) -> Self {
        Self {
            config: config.validated(),
            reserved: HashMap::new(),
            rng,
        }
    }

    /// Generates a name and reserves it.
    pub fn generate(&mut self) -> String {
        let mut candidate = self.candidate();
        let mut attempts = 1;
        while self.is_reserved(&candidate) && attempts < self.config.max_attempts {
            candidate = self.candidate();
            attempts += 1;
        }
        if self.is_reserved(&candidate) {
            tracing::warn!(
                name = %candidate,
                attempts,
                "name pool exhausted, accepting a duplicate name"
            );
        }
        *self.reserved.entry(candidate.clone()).or_insert(0) += 1;
        candidate
    }

    /// Releases one reservation of `name`. Returns `false` if it wasn't
    /// reserved.
    pub fn release(&mut self, name: &str) -> bool {
        match self.reserved.get_mut(name) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.reserved.remove(name);
                true
            }
            None => false,
        }
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains_key(name)
    }

    /// Number of distinct reserved names.
    pub fn reserved_count(&self) -> usize {
        self.reserved.len()
    }

    fn candidate(&mut self) -> String {
        let base = &self.config.base_names[self.rng.random_range(0..self.config.base_names.len())];
        let suffix = self.rng.random_range(0..self.config.suffix_range);
        format!("{base}{suffix}")
    }
}
