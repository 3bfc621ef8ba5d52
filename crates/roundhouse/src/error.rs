//! Unified error type for the Roundhouse meta-crate.

use roundhouse_round::RoundError;
use roundhouse_spawn::SpawnError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `roundhouse` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A spawn-point persistence or parse error.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// A round-controller error (lifecycle, registry, channel).
    #[error(transparent)]
    Round(#[from] RoundError),

    /// The engine could not start with the given configuration.
    #[error("engine startup failed: {0}")]
    Startup(String),
}
