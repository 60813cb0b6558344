//! Error types for the hub layer.

/// Errors returned by [`HubHandle`](crate::HubHandle).
///
/// Event handling inside the hub never fails outward: bad events are
/// logged and dropped. The only thing a caller can observe is the hub
/// itself having gone away.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// The hub's mailbox is closed, or it dropped a reply channel.
    #[error("presence hub is unavailable")]
    Unavailable,
}
