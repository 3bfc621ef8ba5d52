//! Spawn-point allocation for Roundhouse.
//!
//! A [`SpawnStore`] owns the persisted set of placement candidates and,
//! during an active round, the unclaimed working pool that hands each
//! joining player a unique position.
//!
//! # Key types
//!
//! - [`SpawnPoint`] / [`SpawnPointId`] — a placement candidate
//! - [`SpawnStore`] — full set + per-round pool, import/export
//! - [`SpawnBackend`] — persistence seam ([`JsonFileBackend`],
//!   [`MemoryBackend`])
//! - [`SpawnRecord`] — the persisted shape, including the legacy
//!   `"x:y:z[:world]"` string encoding

mod backend;
mod error;
mod point;
mod store;

pub use backend::{JsonFileBackend, MemoryBackend, SpawnBackend};
pub use error::SpawnError;
pub use point::{SpawnData, SpawnFields, SpawnPoint, SpawnPointId, SpawnRecord};
pub use store::{SpawnPatch, SpawnStore};
