//! Error types for the registry.

use plaza_protocol::SessionId;

/// Errors returned by [`SessionRegistry`](crate::SessionRegistry) operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// No live session has this id. Either it never joined, or it was
    /// already removed by a disconnect or a sweep.
    #[error("session {0} not found")]
    NotFound(SessionId),
}
