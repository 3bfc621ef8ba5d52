//! Spawn-point records: the in-memory shape and the persisted shape.

use std::collections::BTreeMap;
use std::fmt;

use roundhouse_types::Vec3;
use serde::{Deserialize, Serialize};

use crate::SpawnError;

/// A unique identifier for a spawn point. Never reused for a different
/// position within the same store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpawnPointId(pub String);

impl fmt::Display for SpawnPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SpawnPointId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A placement candidate: a named, typed, prioritized position with an
/// availability flag and an optional world binding (`None` = the
/// current world).
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnPoint {
    /// Immutable after creation.
    pub id: SpawnPointId,
    pub position: Vec3,
    pub name: String,
    pub world: Option<String>,
    pub available: bool,
    pub metadata: BTreeMap<String, String>,
    /// Higher is preferred by [`best`](crate::SpawnStore::best).
    pub priority: i32,
    /// Free-form type tag, `"default"` unless set.
    pub kind: String,
}

impl SpawnPoint {
    /// The persisted form of this point (always the structured shape).
    pub fn record(&self) -> SpawnRecord {
        SpawnRecord {
            id: self.id.0.clone(),
            data: SpawnData::Full(SpawnFields {
                name: Some(self.name.clone()),
                x: self.position.x,
                y: self.position.y,
                z: self.position.z,
                world: self.world.clone(),
                available: self.available,
                metadata: self.metadata.clone(),
                priority: self.priority,
                kind: self.kind.clone(),
            }),
        }
    }
}

impl fmt::Display for SpawnPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SpawnPoint[id={}, name={}, pos={}, world={}, type={}, priority={}, available={}]",
            self.id,
            self.name,
            self.position,
            self.world.as_deref().unwrap_or("-"),
            self.kind,
            self.priority,
            self.available,
        )
    }
}

/// One persisted spawn-point entry: id plus its data, in either format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnRecord {
    pub id: String,
    pub data: SpawnData,
}

/// The data half of a persisted record.
///
/// Untagged so both shapes deserialize from the same field: the
/// structured map form, and the legacy single-string encoding
/// `"x:y:z"` / `"x:y:z:world"` kept for backward data compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpawnData {
    Full(SpawnFields),
    Legacy(String),
}

/// The structured record shape. Everything except the coordinates is
/// optional on disk and defaulted on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub world: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
}

fn default_available() -> bool {
    true
}

fn default_kind() -> String {
    "default".to_string()
}

impl SpawnRecord {
    /// Converts the record into a spawn point, parsing the legacy string
    /// form when necessary.
    pub fn into_point(self) -> Result<SpawnPoint, SpawnError> {
        let id = SpawnPointId(self.id);
        match self.data {
            SpawnData::Full(f) => Ok(SpawnPoint {
                name: f
                    .name
                    .unwrap_or_else(|| format!("Spawn Point {id}")),
                id,
                position: Vec3::new(f.x, f.y, f.z),
                world: f.world,
                available: f.available,
                metadata: f.metadata,
                priority: f.priority,
                kind: f.kind,
            }),
            SpawnData::Legacy(s) => {
                let (position, world) = parse_legacy(&s)?;
                Ok(SpawnPoint {
                    name: format!("Spawn Point {id}"),
                    id,
                    position,
                    world,
                    available: true,
                    metadata: BTreeMap::new(),
                    priority: 0,
                    kind: default_kind(),
                })
            }
        }
    }
}

/// Parses the legacy `"x:y:z"` / `"x:y:z:world"` position encoding.
fn parse_legacy(s: &str) -> Result<(Vec3, Option<String>), SpawnError> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() < 3 {
        return Err(SpawnError::InvalidRecord(format!(
            "legacy position needs at least x:y:z, got {s:?}"
        )));
    }

    let mut coords = [0.0f64; 3];
    for (slot, part) in coords.iter_mut().zip(&parts[..3]) {
        *slot = part.trim().parse().map_err(|_| {
            SpawnError::InvalidRecord(format!("bad coordinate {part:?} in {s:?}"))
        })?;
    }

    let world = parts.get(3).map(|w| w.to_string());
    Ok((Vec3::new(coords[0], coords[1], coords[2]), world))
}
