//! Integration tests for the spawn-point store and its per-round pool.

use std::collections::BTreeMap;

use roundhouse_spawn::{
    JsonFileBackend, MemoryBackend, SpawnBackend, SpawnData, SpawnFields, SpawnPatch,
    SpawnPointId, SpawnRecord, SpawnStore,
};
use roundhouse_types::Vec3;

// =========================================================================
// Helpers
// =========================================================================

fn empty_store() -> SpawnStore {
    SpawnStore::load(Box::new(MemoryBackend::new())).unwrap()
}

fn add_simple(store: &mut SpawnStore, x: f64) -> SpawnPointId {
    store.add(
        Vec3::new(x, 64.0, 0.0),
        None,
        None,
        BTreeMap::new(),
        0,
        "default".to_string(),
    )
}

fn full_record(id: &str, x: f64, priority: i32) -> SpawnRecord {
    SpawnRecord {
        id: id.to_string(),
        data: SpawnData::Full(SpawnFields {
            name: Some(format!("point {id}")),
            x,
            y: 64.0,
            z: 0.0,
            world: None,
            available: true,
            metadata: BTreeMap::new(),
            priority,
            kind: "default".to_string(),
        }),
    }
}

// =========================================================================
// Add / remove / update / get
// =========================================================================

#[test]
fn test_add_generates_unique_ids_and_default_names() {
    let mut store = empty_store();
    let a = add_simple(&mut store, 1.0);
    let b = add_simple(&mut store, 2.0);

    assert_ne!(a, b);
    assert_eq!(store.get(&a).unwrap().name, "Spawn Point 1");
    assert_eq!(store.get(&b).unwrap().name, "Spawn Point 2");
}

#[test]
fn test_add_persists_immediately() {
    let backend = MemoryBackend::new();
    let mut store = SpawnStore::load(Box::new(backend.clone())).unwrap();
    add_simple(&mut store, 1.0);

    assert_eq!(backend.snapshot().len(), 1);
}

#[test]
fn test_remove_known_and_unknown() {
    let mut store = empty_store();
    let id = add_simple(&mut store, 1.0);

    assert!(store.remove(&id));
    assert!(!store.remove(&id));
    assert!(store.is_empty());
}

#[test]
fn test_update_patches_only_provided_fields() {
    let mut store = empty_store();
    let id = store.add(
        Vec3::new(1.0, 64.0, 0.0),
        Some("Base".to_string()),
        Some("game".to_string()),
        BTreeMap::new(),
        3,
        "base".to_string(),
    );

    let patched = store.update(
        &id,
        SpawnPatch {
            priority: Some(9),
            available: Some(false),
            ..SpawnPatch::default()
        },
    );
    assert!(patched);

    let point = store.get(&id).unwrap();
    assert_eq!(point.priority, 9);
    assert!(!point.available);
    // Untouched fields keep their prior values.
    assert_eq!(point.name, "Base");
    assert_eq!(point.world.as_deref(), Some("game"));
    assert_eq!(point.kind, "base");
}

#[test]
fn test_update_unknown_id_is_false() {
    let mut store = empty_store();
    assert!(!store.update(&"nope".into(), SpawnPatch::default()));
}

#[test]
fn test_clear_drops_everything() {
    let backend = MemoryBackend::new();
    let mut store = SpawnStore::load(Box::new(backend.clone())).unwrap();
    add_simple(&mut store, 1.0);
    add_simple(&mut store, 2.0);

    store.clear();
    assert!(store.is_empty());
    assert!(backend.snapshot().is_empty());
}

#[test]
fn test_ids_not_reused_after_remove() {
    let mut store = empty_store();
    let a = add_simple(&mut store, 1.0);
    store.remove(&a);
    let b = add_simple(&mut store, 2.0);
    assert_ne!(a, b);
}

// =========================================================================
// Pool: repopulate / claim / clear
// =========================================================================

#[test]
fn test_claim_returns_distinct_positions_then_none() {
    let mut store = empty_store();
    for x in 0..5 {
        add_simple(&mut store, x as f64);
    }
    store.repopulate_pool();

    let mut claimed = Vec::new();
    for _ in 0..5 {
        let pos = store.claim().expect("pool should not be exhausted yet");
        assert!(!claimed.contains(&pos), "duplicate claim: {pos}");
        claimed.push(pos);
    }

    assert_eq!(store.claim(), None);
    assert_eq!(store.pool_len(), 0);
}

#[test]
fn test_claim_on_never_populated_pool_is_none() {
    let mut store = empty_store();
    add_simple(&mut store, 1.0);
    assert_eq!(store.claim(), None);
}

#[test]
fn test_repopulate_restores_full_set_after_claims() {
    let mut store = empty_store();
    for x in 0..3 {
        add_simple(&mut store, x as f64);
    }

    store.repopulate_pool();
    store.claim();
    store.claim();
    assert_eq!(store.pool_len(), 1);

    store.repopulate_pool();
    assert_eq!(store.pool_len(), 3);
}

#[test]
fn test_clear_pool_keeps_full_set() {
    let mut store = empty_store();
    add_simple(&mut store, 1.0);
    store.repopulate_pool();

    store.clear_pool();
    assert_eq!(store.pool_len(), 0);
    assert_eq!(store.len(), 1);
}

// =========================================================================
// Best / filtered views
// =========================================================================

#[test]
fn test_best_prefers_highest_priority() {
    let mut store = empty_store();
    store.import(
        vec![
            full_record("a", 1.0, 1),
            full_record("b", 2.0, 7),
            full_record("c", 3.0, 4),
        ],
        false,
    );

    assert_eq!(store.best(None, None).unwrap().id, "b".into());
}

#[test]
fn test_best_tie_goes_to_first_encountered() {
    let mut store = empty_store();
    store.import(
        vec![full_record("first", 1.0, 5), full_record("second", 2.0, 5)],
        false,
    );

    assert_eq!(store.best(None, None).unwrap().id, "first".into());
}

#[test]
fn test_best_skips_unavailable_and_applies_filters() {
    let mut store = empty_store();
    let top = store.add(
        Vec3::new(1.0, 64.0, 0.0),
        None,
        Some("game".to_string()),
        BTreeMap::new(),
        10,
        "base".to_string(),
    );
    store.add(
        Vec3::new(2.0, 64.0, 0.0),
        None,
        Some("game".to_string()),
        BTreeMap::new(),
        2,
        "base".to_string(),
    );
    store.update(
        &top,
        SpawnPatch {
            available: Some(false),
            ..SpawnPatch::default()
        },
    );

    // Highest-priority point is unavailable, so the next one wins.
    let best = store.best(Some("game"), Some("base")).unwrap();
    assert_eq!(best.position, Vec3::new(2.0, 64.0, 0.0));

    assert!(store.best(Some("lobby"), None).is_none());
    assert!(store.best(None, Some("sniper")).is_none());
}

#[test]
fn test_filtered_views() {
    let mut store = empty_store();
    store.add(
        Vec3::new(1.0, 64.0, 0.0),
        None,
        Some("game".to_string()),
        BTreeMap::new(),
        0,
        "base".to_string(),
    );
    let hidden = store.add(
        Vec3::new(2.0, 64.0, 0.0),
        None,
        None,
        BTreeMap::new(),
        0,
        "default".to_string(),
    );
    store.update(
        &hidden,
        SpawnPatch {
            available: Some(false),
            ..SpawnPatch::default()
        },
    );

    assert_eq!(store.by_world("game").len(), 1);
    assert_eq!(store.by_kind("base").len(), 1);
    assert_eq!(store.available().len(), 1);
}

#[test]
fn test_random_draws_from_the_full_set() {
    let mut store = empty_store();
    assert!(store.random().is_none());

    let ids: Vec<_> = (0..3).map(|i| add_simple(&mut store, i as f64)).collect();
    for _ in 0..20 {
        let picked = store.random().unwrap();
        assert!(ids.contains(&picked.id));
    }
}

// =========================================================================
// Import / export
// =========================================================================

#[test]
fn test_import_skips_existing_without_overwrite() {
    let mut store = empty_store();
    store.import(vec![full_record("a", 1.0, 0)], false);

    let written = store.import(vec![full_record("a", 99.0, 0)], false);
    assert_eq!(written, 0);
    assert_eq!(
        store.get(&"a".into()).unwrap().position,
        Vec3::new(1.0, 64.0, 0.0)
    );
}

#[test]
fn test_import_overwrite_replaces_record() {
    let mut store = empty_store();
    store.import(vec![full_record("a", 1.0, 0)], false);

    let written = store.import(vec![full_record("a", 99.0, 0)], true);
    assert_eq!(written, 1);
    assert_eq!(
        store.get(&"a".into()).unwrap().position,
        Vec3::new(99.0, 64.0, 0.0)
    );
}

#[test]
fn test_import_skips_malformed_records() {
    let mut store = empty_store();
    let written = store.import(
        vec![
            SpawnRecord {
                id: "bad".to_string(),
                data: SpawnData::Legacy("not-a-position".to_string()),
            },
            full_record("good", 1.0, 0),
        ],
        false,
    );
    assert_eq!(written, 1);
    assert!(store.get(&"bad".into()).is_none());
}

#[test]
fn test_import_accepts_legacy_strings() {
    let mut store = empty_store();
    let written = store.import(
        vec![SpawnRecord {
            id: "old".to_string(),
            data: SpawnData::Legacy("4:70:-2:game".to_string()),
        }],
        false,
    );
    assert_eq!(written, 1);

    let point = store.get(&"old".into()).unwrap();
    assert_eq!(point.position, Vec3::new(4.0, 70.0, -2.0));
    assert_eq!(point.world.as_deref(), Some("game"));
}

#[test]
fn test_export_import_roundtrip() {
    let mut store = empty_store();
    let mut metadata = BTreeMap::new();
    metadata.insert("team".to_string(), "blue".to_string());
    store.add(
        Vec3::new(1.0, 64.0, -4.5),
        Some("Blue Base".to_string()),
        Some("game".to_string()),
        metadata,
        3,
        "base".to_string(),
    );

    let exported = store.export();
    let mut other = empty_store();
    assert_eq!(other.import(exported, false), 1);
    assert_eq!(other.list(), store.list());
}

#[test]
fn test_generated_ids_stay_ahead_of_imports() {
    let mut store = empty_store();
    store.import(vec![full_record("spawn_10", 1.0, 0)], false);

    let id = add_simple(&mut store, 2.0);
    assert_eq!(id, "spawn_11".into());
}

// =========================================================================
// JSON file backend
// =========================================================================

#[test]
fn test_json_file_backend_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spawnpoints.json");

    {
        let mut store = SpawnStore::load(Box::new(JsonFileBackend::new(&path))).unwrap();
        add_simple(&mut store, 1.0);
        add_simple(&mut store, 2.0);
    }

    let store = SpawnStore::load(Box::new(JsonFileBackend::new(&path))).unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(store.list()[0].name, "Spawn Point 1");
}

#[test]
fn test_json_file_backend_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let mut backend = JsonFileBackend::new(dir.path().join("absent.json"));
    assert!(backend.load().unwrap().is_empty());
}

#[test]
fn test_load_skips_malformed_records() {
    let backend = MemoryBackend::with_records(vec![
        SpawnRecord {
            id: "bad".to_string(),
            data: SpawnData::Legacy("1:2".to_string()),
        },
        full_record("good", 1.0, 0),
    ]);

    let store = SpawnStore::load(Box::new(backend)).unwrap();
    assert_eq!(store.len(), 1);
    assert!(store.get(&"good".into()).is_some());
}
