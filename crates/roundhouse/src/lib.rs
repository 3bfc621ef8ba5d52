//! # Roundhouse
//!
//! Round-based minigame coordination for game servers.
//!
//! Roundhouse runs one round at a time through a fixed lifecycle —
//! Waiting, Starting, Playing, Ended — and coordinates everything that
//! hangs off it: the start countdown, the round clock, the post-game
//! reset, pluggable per-round services, and unique spawn-point
//! allocation with JSON persistence.
//!
//! The host embeds it by implementing [`PlayerDirectory`] (teleports,
//! messages, kicks) and wiring player join/leave/respawn events into a
//! [`RoundHandle`]. All round state lives in one task; the handle is
//! the only way in.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use roundhouse::prelude::*;
//!
//! let engine = RoundEngine::builder()
//!     .config(RoundConfig::default())
//!     .spawn_file("data/spawnpoints.json")
//!     .directory(Box::new(my_server_adapter))
//!     .build()
//!     .await?;
//!
//! let round = engine.handle();
//! round.join(player).await?;
//! ```

mod engine;
mod error;

pub use engine::{init_tracing, RoundEngine, RoundEngineBuilder};
pub use error::EngineError;

pub use roundhouse_round::{
    DisplayValues, GameService, PlayerDirectory, RegistryError, RoundConfig, RoundError,
    RoundHandle, RoundInfo, RoundState, ServiceError,
};
pub use roundhouse_spawn::{
    JsonFileBackend, MemoryBackend, SpawnBackend, SpawnData, SpawnError, SpawnPatch, SpawnPoint,
    SpawnPointId, SpawnRecord, SpawnStore,
};
pub use roundhouse_types::{PlayerId, Vec3};

pub mod prelude {
    pub use crate::{
        DisplayValues, EngineError, GameService, PlayerDirectory, PlayerId, RoundConfig,
        RoundEngine, RoundHandle, RoundInfo, RoundState, ServiceError, SpawnPoint, Vec3,
    };
}
