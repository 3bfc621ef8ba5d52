//! Shared types used across the Roundhouse crates.
//!
//! These are the identifiers and geometry primitives that cross crate
//! boundaries: player identity for the round controller and the spawn
//! allocator, and positions for spawn points and teleports.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A unique identifier for a player.
///
/// Newtype over `u64` so a player id can't be confused with any other
/// numeric id in a signature. Serialized as the bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A position in 3D world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}, {:.1}, {:.1}", self.x, self.y, self.z)
    }
}
