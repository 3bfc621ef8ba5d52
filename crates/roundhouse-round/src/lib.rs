//! Round lifecycle coordination.
//!
//! The controller moves one round through its four phases — Waiting,
//! Starting, Playing, Ended — and back, driving gameplay services and
//! spawn allocation along the way. See [`spawn_round`] for the entry
//! point and [`RoundHandle`] for the API.

mod config;
mod directory;
mod error;
mod round;
mod service;

pub use config::{RoundConfig, RoundState};
pub use directory::PlayerDirectory;
pub use error::{RegistryError, RoundError};
pub use round::{spawn_round, DisplayValues, RoundHandle, RoundInfo};
pub use service::{GameService, ServiceError, ServiceRegistry};
