//! Recoverable driver errors. Broken invariants panic instead.

use thiserror::Error;

use super::body::BodyId;

/// Error type for registry and lifecycle operations
#[derive(Debug, Error)]
pub enum SimError {
    /// A body with this id is already registered.
    #[error("body {0} is already registered")]
    DuplicateBody(BodyId),
    /// `start` was called while the loop is running.
    #[error("physics loop is already running")]
    AlreadyRunning,
    /// The physics thread could not be spawned.
    #[error("failed to spawn physics thread: {0}")]
    Spawn(#[from] std::io::Error),
}
