//! Error types for the round layer.

use roundhouse_types::PlayerId;

/// Errors surfaced by the round controller.
#[derive(Debug, thiserror::Error)]
pub enum RoundError {
    /// A join was attempted after the round left the Waiting state.
    #[error("the round has already started")]
    RoundInProgress,

    /// The player is already in the active set.
    #[error("player {0} already joined")]
    AlreadyJoined(PlayerId),

    /// The player is not in the active set.
    #[error("player {0} has not joined this round")]
    NotJoined(PlayerId),

    /// The controller's command channel is closed (shut down).
    #[error("round controller is unavailable")]
    Unavailable,

    /// A service registry operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Errors from the service registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A service with the same identity is already registered.
    #[error("service {0:?} is already registered")]
    AlreadyRegistered(String),

    /// No service with that identity is registered.
    #[error("service {0:?} not found")]
    NotFound(String),
}
