//! Hub configuration.

use std::time::Duration;

use plaza_registry::RegistryConfig;

/// Tunables for the presence hub.
///
/// ```
/// use std::time::Duration;
/// use plaza_hub::HubConfig;
///
/// let config = HubConfig {
///     proximity_radius: 350.0,
///     session_timeout: Duration::from_secs(120),
///     ..HubConfig::default()
/// };
/// assert_eq!(config.sweep_interval, Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Radius for `proximity-query`, in world units. Never client-supplied.
    pub proximity_radius: f64,

    /// How often the liveness sweep runs.
    pub sweep_interval: Duration,

    /// A session idle for longer than this is removed by the sweep.
    pub session_timeout: Duration,

    /// Capacity of the hub's command mailbox. Senders wait when it is full.
    pub mailbox_capacity: usize,

    /// Join defaults and name generation.
    pub registry: RegistryConfig,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            proximity_radius: 200.0,
            sweep_interval: Duration::from_secs(60),
            session_timeout: Duration::from_secs(300),
            mailbox_capacity: 1024,
            registry: RegistryConfig::default(),
        }
    }
}

impl HubConfig {
    /// Replaces values the hub cannot run with, logging each fix.
    ///
    /// A zero `sweep_interval` would make `tokio::time::interval` panic,
    /// and a zero mailbox would make `mpsc::channel` panic.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        if self.sweep_interval.is_zero() {
            tracing::warn!("sweep_interval is zero, using default");
            self.sweep_interval = defaults.sweep_interval;
        }
        if self.mailbox_capacity == 0 {
            tracing::warn!("mailbox_capacity is zero, using default");
            self.mailbox_capacity = defaults.mailbox_capacity;
        }
        if !self.proximity_radius.is_finite() || self.proximity_radius < 0.0 {
            tracing::warn!(radius = self.proximity_radius, "invalid proximity_radius, using default");
            self.proximity_radius = defaults.proximity_radius;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hub_config_default() {
        let config = HubConfig::default();
        assert_eq!(config.proximity_radius, 200.0);
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.session_timeout, Duration::from_secs(300));
        assert_eq!(config.mailbox_capacity, 1024);
    }

    #[test]
    fn test_validated_replaces_unusable_values() {
        let config = HubConfig {
            proximity_radius: f64::NAN,
            sweep_interval: Duration::ZERO,
            mailbox_capacity: 0,
            ..HubConfig::default()
        }
        .validated();

        assert_eq!(config.proximity_radius, 200.0);
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.mailbox_capacity, 1024);
    }

    #[test]
    fn test_validated_keeps_sane_values() {
        let config = HubConfig {
            proximity_radius: 50.0,
            sweep_interval: Duration::from_secs(5),
            ..HubConfig::default()
        }
        .validated();

        assert_eq!(config.proximity_radius, 50.0);
        assert_eq!(config.sweep_interval, Duration::from_secs(5));
    }
}
