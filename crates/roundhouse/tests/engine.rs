//! Engine assembly and full-round scenario tests.

use std::io::Write as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use roundhouse::{
    EngineError, MemoryBackend, PlayerDirectory, PlayerId, RoundConfig, RoundEngine, RoundState,
    SpawnData, SpawnRecord, Vec3,
};
use tokio::time::sleep;

/// Minimal host double: counts kicks, remembers online players.
#[derive(Clone, Default)]
struct Host {
    online: Arc<Mutex<Vec<PlayerId>>>,
    kicked: Arc<Mutex<Vec<PlayerId>>>,
}

impl PlayerDirectory for Host {
    fn teleport(&mut self, _player: PlayerId, _world: &str, _position: Option<Vec3>) {}

    fn send_message(&mut self, _player: PlayerId, _text: &str) {}

    fn send_title(&mut self, _player: PlayerId, _text: &str) {}

    fn kick(&mut self, player: PlayerId, _reason: &str) {
        self.kicked.lock().unwrap().push(player);
        self.online.lock().unwrap().retain(|p| *p != player);
    }

    fn list_online(&self) -> Vec<PlayerId> {
        self.online.lock().unwrap().clone()
    }
}

fn seeded_backend(count: usize) -> MemoryBackend {
    let records = (0..count)
        .map(|i| SpawnRecord {
            id: format!("spawn_{i}"),
            data: SpawnData::Legacy(format!("{}:64:0", i * 16)),
        })
        .collect();
    MemoryBackend::with_records(records)
}

#[tokio::test]
async fn test_build_requires_a_directory() {
    let err = RoundEngine::builder().build().await.unwrap_err();
    assert!(matches!(err, EngineError::Startup(_)));
}

#[tokio::test]
async fn test_build_rejects_invalid_config() {
    let config = RoundConfig {
        required_players: 0,
        ..RoundConfig::default()
    };
    let err = RoundEngine::builder()
        .config(config)
        .directory(Box::new(Host::default()))
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Startup(_)));
}

#[tokio::test]
async fn test_build_fails_on_corrupt_spawn_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{{not json").unwrap();

    let err = RoundEngine::builder()
        .spawn_file(file.path())
        .directory(Box::new(Host::default()))
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Spawn(_)));
}

#[tokio::test]
async fn test_build_loads_persisted_spawn_points() {
    let engine = RoundEngine::builder()
        .spawn_backend(Box::new(seeded_backend(3)))
        .directory(Box::new(Host::default()))
        .build()
        .await
        .unwrap();

    let points = engine.handle().list_spawn_points().await.unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[1].position, Vec3::new(16.0, 64.0, 0.0));
}

/// Two players, a 60-second round, a 10-second post-game wait: the
/// round ends by timeout 60 seconds after it starts, and the server
/// resets (kicking both) 10 seconds after that.
#[tokio::test(start_paused = true)]
async fn test_two_player_round_times_out_and_resets() {
    let host = Host::default();
    let engine = RoundEngine::builder()
        .config(RoundConfig {
            required_players: 2,
            countdown: Duration::from_secs(5),
            max_round_time: Duration::from_secs(60),
            post_game_wait: Duration::from_secs(10),
            ..RoundConfig::default()
        })
        .spawn_backend(Box::new(seeded_backend(4)))
        .directory(Box::new(host.clone()))
        .build()
        .await
        .unwrap();
    let round = engine.handle();

    for i in 1..=2 {
        let p = PlayerId::new(i);
        host.online.lock().unwrap().push(p);
        round.join(p).await.unwrap();
    }
    assert_eq!(round.info().await.unwrap().state, RoundState::Starting);

    // Countdown elapses; the round starts and each player claims a point.
    sleep(Duration::from_millis(5100)).await;
    let info = round.info().await.unwrap();
    assert_eq!(info.state, RoundState::Playing);
    assert_eq!(info.pool_remaining, 2);

    // 60 seconds of play, then timeout.
    sleep(Duration::from_secs(60)).await;
    let info = round.info().await.unwrap();
    assert_eq!(info.state, RoundState::Ended);
    assert_eq!(info.winner, None);
    assert!(host.kicked.lock().unwrap().is_empty());

    // 10 more seconds, then the reset kicks everyone out.
    sleep(Duration::from_millis(10_100)).await;
    let info = round.info().await.unwrap();
    assert_eq!(info.state, RoundState::Waiting);
    assert_eq!(info.joined_count, 0);
    assert_eq!(host.kicked.lock().unwrap().len(), 2);

    // The persisted set survives the reset; only the pool was drained.
    assert_eq!(round.list_spawn_points().await.unwrap().len(), 4);
    assert_eq!(info.pool_remaining, 0);

    engine.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_spawn_administration_through_the_handle() {
    let engine = RoundEngine::builder()
        .directory(Box::new(Host::default()))
        .build()
        .await
        .unwrap();
    let round = engine.handle();

    let id = round
        .add_spawn_point(
            Vec3::new(100.0, 70.0, -20.0),
            Some("Hilltop".into()),
            Some("arena".into()),
            Default::default(),
            5,
            "sniper".into(),
        )
        .await
        .unwrap();

    let point = round.get_spawn_point(id.clone()).await.unwrap().unwrap();
    assert_eq!(point.name, "Hilltop");
    assert_eq!(point.priority, 5);

    let best = round
        .best_spawn_point(Some("arena".into()), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(best.id, id);

    assert!(round.remove_spawn_point(id).await.unwrap());
    assert!(round.list_spawn_points().await.unwrap().is_empty());
}
