//! The spawn-point store: the persisted full set plus the per-round
//! unclaimed pool.
//!
//! The store is a plain synchronous struct. The round actor owns it and
//! is the only execution context that ever touches it, so no locking is
//! needed here; claim-then-remove is one logical step because nothing
//! can interleave with it.

use std::collections::BTreeMap;

use rand::Rng;
use roundhouse_types::Vec3;
use tracing::{error, info, warn};

use crate::{SpawnBackend, SpawnError, SpawnPoint, SpawnPointId, SpawnRecord};

/// Partial update for an existing spawn point. `None` fields keep their
/// prior value.
#[derive(Debug, Clone, Default)]
pub struct SpawnPatch {
    pub position: Option<Vec3>,
    pub name: Option<String>,
    pub available: Option<bool>,
    pub world: Option<String>,
    pub metadata: Option<BTreeMap<String, String>>,
    pub priority: Option<i32>,
    pub kind: Option<String>,
}

/// Owns the full spawn-point set (persisted through a [`SpawnBackend`])
/// and, during an active round, the unclaimed working pool.
pub struct SpawnStore {
    backend: Box<dyn SpawnBackend>,
    /// Insertion-ordered; ids are unique.
    points: Vec<SpawnPoint>,
    /// Positions not yet handed out this round. Repopulated from the
    /// full set exactly once per round start.
    pool: Vec<Vec3>,
    next_id: u64,
}

impl SpawnStore {
    /// Loads the store from a backend. Malformed individual records are
    /// logged and skipped; a backend failure propagates (a store that
    /// cannot load at all is a startup error, not a runtime one).
    pub fn load(mut backend: Box<dyn SpawnBackend>) -> Result<Self, SpawnError> {
        let records = backend.load()?;

        let mut points: Vec<SpawnPoint> = Vec::with_capacity(records.len());
        for record in records {
            let id = record.id.clone();
            match record.into_point() {
                Ok(point) => {
                    if points.iter().any(|p| p.id == point.id) {
                        warn!(%id, "duplicate spawn point id, skipping");
                    } else {
                        points.push(point);
                    }
                }
                Err(e) => warn!(%id, error = %e, "failed to load spawn point"),
            }
        }

        let next_id = points
            .iter()
            .filter_map(|p| p.id.0.strip_prefix("spawn_"))
            .filter_map(|n| n.parse::<u64>().ok())
            .max()
            .map_or(1, |max| max + 1);

        info!(count = points.len(), "loaded spawn points");

        Ok(Self {
            backend,
            points,
            pool: Vec::new(),
            next_id,
        })
    }

    // -- full-set operations -------------------------------------------

    /// Adds a spawn point, generating a store-unique id. The name
    /// defaults to "Spawn Point N" (N = 1-based count at insertion).
    /// Persists immediately.
    pub fn add(
        &mut self,
        position: Vec3,
        name: Option<String>,
        world: Option<String>,
        metadata: BTreeMap<String, String>,
        priority: i32,
        kind: String,
    ) -> SpawnPointId {
        let id = self.generate_id();
        let name = name.unwrap_or_else(|| format!("Spawn Point {}", self.points.len() + 1));

        info!(%id, %name, %position, world = world.as_deref().unwrap_or("-"), "added spawn point");

        self.points.push(SpawnPoint {
            id: id.clone(),
            position,
            name,
            world,
            available: true,
            metadata,
            priority,
            kind,
        });
        self.persist();
        id
    }

    /// Removes a spawn point by id. Returns whether anything was removed.
    pub fn remove(&mut self, id: &SpawnPointId) -> bool {
        let before = self.points.len();
        self.points.retain(|p| &p.id != id);
        if self.points.len() == before {
            return false;
        }
        self.persist();
        info!(%id, "removed spawn point");
        true
    }

    /// Applies a partial update to a spawn point. Returns `false` when
    /// the id is unknown.
    pub fn update(&mut self, id: &SpawnPointId, patch: SpawnPatch) -> bool {
        let Some(point) = self.points.iter_mut().find(|p| &p.id == id) else {
            return false;
        };

        if let Some(position) = patch.position {
            point.position = position;
        }
        if let Some(name) = patch.name {
            point.name = name;
        }
        if let Some(available) = patch.available {
            point.available = available;
        }
        if let Some(world) = patch.world {
            point.world = Some(world);
        }
        if let Some(metadata) = patch.metadata {
            point.metadata = metadata;
        }
        if let Some(priority) = patch.priority {
            point.priority = priority;
        }
        if let Some(kind) = patch.kind {
            point.kind = kind;
        }

        self.persist();
        info!(%id, "updated spawn point");
        true
    }

    pub fn get(&self, id: &SpawnPointId) -> Option<&SpawnPoint> {
        self.points.iter().find(|p| &p.id == id)
    }

    /// All spawn points in insertion order.
    pub fn list(&self) -> &[SpawnPoint] {
        &self.points
    }

    /// Drops every spawn point. Destructive and irreversible — callers
    /// are expected to have confirmed intent.
    pub fn clear(&mut self) {
        let count = self.points.len();
        self.points.clear();
        self.persist();
        info!(count, "cleared all spawn points");
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    // -- filtered views -------------------------------------------------

    pub fn by_world(&self, world: &str) -> Vec<&SpawnPoint> {
        self.points
            .iter()
            .filter(|p| p.world.as_deref() == Some(world))
            .collect()
    }

    pub fn by_kind(&self, kind: &str) -> Vec<&SpawnPoint> {
        self.points.iter().filter(|p| p.kind == kind).collect()
    }

    pub fn available(&self) -> Vec<&SpawnPoint> {
        self.points.iter().filter(|p| p.available).collect()
    }

    /// A uniformly random spawn point from the full set.
    pub fn random(&self) -> Option<&SpawnPoint> {
        if self.points.is_empty() {
            return None;
        }
        let idx = rand::rng().random_range(0..self.points.len());
        self.points.get(idx)
    }

    /// The highest-priority *available* point matching the filters.
    /// Ties go to the first-encountered point.
    pub fn best(&self, world: Option<&str>, kind: Option<&str>) -> Option<&SpawnPoint> {
        self.points
            .iter()
            .filter(|p| p.available)
            .filter(|p| world.is_none_or(|w| p.world.as_deref() == Some(w)))
            .filter(|p| kind.is_none_or(|k| p.kind == k))
            .fold(None, |best: Option<&SpawnPoint>, candidate| match best {
                Some(b) if b.priority >= candidate.priority => Some(b),
                _ => Some(candidate),
            })
    }

    // -- per-round pool ---------------------------------------------------

    /// Rebuilds the unclaimed pool from the full set. Called exactly
    /// once per round start.
    pub fn repopulate_pool(&mut self) {
        self.pool = self.points.iter().map(|p| p.position).collect();
        info!(pool = self.pool.len(), "spawn pool repopulated");
    }

    /// Claims one position from the unclaimed pool, uniformly at random.
    /// Selection and removal are one step (swap-remove), so two
    /// consecutive claims can never return the same position. Returns
    /// `None` when the pool is exhausted — an expected, recoverable
    /// condition.
    pub fn claim(&mut self) -> Option<Vec3> {
        if self.pool.is_empty() {
            return None;
        }
        let idx = rand::rng().random_range(0..self.pool.len());
        Some(self.pool.swap_remove(idx))
    }

    /// Drops the working pool. The full set stays persisted for the
    /// next round.
    pub fn clear_pool(&mut self) {
        self.pool.clear();
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    // -- import / export ---------------------------------------------------

    /// Exports the full set as an ordered record array.
    pub fn export(&self) -> Vec<SpawnRecord> {
        self.points.iter().map(SpawnPoint::record).collect()
    }

    /// Imports records. Existing ids are skipped unless `overwrite` is
    /// set; malformed records are logged and skipped. Returns the number
    /// of records actually written.
    pub fn import(&mut self, records: Vec<SpawnRecord>, overwrite: bool) -> usize {
        let mut written = 0;

        for record in records {
            let id = record.id.clone();
            let point = match record.into_point() {
                Ok(p) => p,
                Err(e) => {
                    warn!(%id, error = %e, "skipping malformed import record");
                    continue;
                }
            };

            match self.points.iter_mut().find(|p| p.id == point.id) {
                Some(existing) => {
                    if !overwrite {
                        continue;
                    }
                    *existing = point;
                }
                None => self.points.push(point),
            }
            written += 1;
        }

        if written > 0 {
            // Keep generated ids ahead of anything imported.
            self.next_id = self
                .points
                .iter()
                .filter_map(|p| p.id.0.strip_prefix("spawn_"))
                .filter_map(|n| n.parse::<u64>().ok())
                .max()
                .map_or(self.next_id, |max| self.next_id.max(max + 1));
            self.persist();
            info!(written, "imported spawn points");
        }

        written
    }

    // -- internals ---------------------------------------------------------

    fn generate_id(&mut self) -> SpawnPointId {
        loop {
            let candidate = SpawnPointId(format!("spawn_{}", self.next_id));
            self.next_id += 1;
            if self.get(&candidate).is_none() {
                return candidate;
            }
        }
    }

    /// Saves the full set through the backend. A save failure is logged
    /// and does not roll back the in-memory mutation.
    fn persist(&mut self) {
        let records = self.export();
        if let Err(e) = self.backend.save(&records) {
            error!(error = %e, "failed to persist spawn points");
        }
    }
}
