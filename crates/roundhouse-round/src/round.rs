//! Round actor: an isolated Tokio task that owns the entire round.
//!
//! All round state — the state machine, the player set, the spawn
//! store, the service registry, and the three timers — lives inside one
//! task. The outside world (player event glue, operator commands, the
//! display renderer) talks to it through an mpsc channel, so every
//! mutation is serialized through a single execution context and no
//! locking is needed anywhere in the core.
//!
//! Timer ticks arrive on a second channel fed by
//! [`roundhouse_timer::spawn_repeating`]; a tick that raced a
//! cancellation is discarded by the state guard in its handler.

use std::collections::{BTreeMap, HashMap, HashSet};

use roundhouse_spawn::{SpawnPatch, SpawnPoint, SpawnPointId, SpawnRecord, SpawnStore};
use roundhouse_timer::{spawn_repeating, TimerHandle};
use roundhouse_types::{PlayerId, Vec3};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::{GameService, PlayerDirectory, RoundConfig, RoundError, RoundState, ServiceRegistry};

/// Command channel size for the round actor.
const CHANNEL_SIZE: usize = 64;

/// Which repeating timer a tick came from. Only one timer of each kind
/// is ever outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickKind {
    Countdown,
    Update,
    PostGame,
}

/// A snapshot of round metadata.
#[derive(Debug, Clone)]
pub struct RoundInfo {
    /// Current lifecycle state.
    pub state: RoundState,
    /// Number of joined players.
    pub joined_count: usize,
    /// The active player set (unordered).
    pub players: Vec<PlayerId>,
    /// The winner, when the round was won rather than timed out.
    pub winner: Option<PlayerId>,
    /// Number of registered services.
    pub services: usize,
    /// Spawn points left in the unclaimed pool.
    pub pool_remaining: usize,
}

/// Lazily evaluated display text, pulled by an external renderer on its
/// own cadence. Fields are `None` outside the phase they belong to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayValues {
    /// "M:SS" round clock; Playing only.
    pub time_left: Option<String>,
    /// "Winner" or "Round Over"; Ended only.
    pub finish_text: Option<String>,
    /// Winner name or "Time is up!"; Ended only.
    pub finish_reason: Option<String>,
    /// "Reset in: Ns"; Ended only.
    pub reset_countdown: Option<String>,
}

/// Commands sent to the round actor through its channel.
pub(crate) enum RoundCommand {
    Join {
        player: PlayerId,
        reply: oneshot::Sender<Result<(), RoundError>>,
    },
    Leave {
        player: PlayerId,
        reply: oneshot::Sender<Result<(), RoundError>>,
    },
    /// External win signal (fire-and-forget).
    PlayerWon { player: PlayerId },
    /// Re-teleport a respawning player to their claimed point.
    Respawn { player: PlayerId },
    RegisterService {
        service: Box<dyn GameService>,
        reply: oneshot::Sender<Result<(), RoundError>>,
    },
    UnregisterService {
        id: String,
        reply: oneshot::Sender<Result<(), RoundError>>,
    },
    Spawn(SpawnOp),
    Info {
        reply: oneshot::Sender<RoundInfo>,
    },
    Display {
        reply: oneshot::Sender<DisplayValues>,
    },
    Shutdown,
}

/// Spawn-point administration, forwarded to the store inside the actor
/// so pool and set mutations stay on the single execution context.
pub(crate) enum SpawnOp {
    Add {
        position: Vec3,
        name: Option<String>,
        world: Option<String>,
        metadata: BTreeMap<String, String>,
        priority: i32,
        kind: String,
        reply: oneshot::Sender<SpawnPointId>,
    },
    Remove {
        id: SpawnPointId,
        reply: oneshot::Sender<bool>,
    },
    Update {
        id: SpawnPointId,
        patch: SpawnPatch,
        reply: oneshot::Sender<bool>,
    },
    Get {
        id: SpawnPointId,
        reply: oneshot::Sender<Option<SpawnPoint>>,
    },
    List {
        reply: oneshot::Sender<Vec<SpawnPoint>>,
    },
    Clear {
        reply: oneshot::Sender<()>,
    },
    Best {
        world: Option<String>,
        kind: Option<String>,
        reply: oneshot::Sender<Option<SpawnPoint>>,
    },
    Import {
        records: Vec<SpawnRecord>,
        overwrite: bool,
        reply: oneshot::Sender<usize>,
    },
    Export {
        reply: oneshot::Sender<Vec<SpawnRecord>>,
    },
}

/// Handle to the running round actor. Cheap to clone.
#[derive(Clone, Debug)]
pub struct RoundHandle {
    sender: mpsc::Sender<RoundCommand>,
}

impl RoundHandle {
    async fn request<R>(
        &self,
        make: impl FnOnce(oneshot::Sender<R>) -> RoundCommand,
    ) -> Result<R, RoundError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(make(tx))
            .await
            .map_err(|_| RoundError::Unavailable)?;
        rx.await.map_err(|_| RoundError::Unavailable)
    }

    async fn send(&self, cmd: RoundCommand) -> Result<(), RoundError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoundError::Unavailable)
    }

    /// Requests to join the round. Rejected once the round has left
    /// Waiting — the directory also receives a hard kick for the player
    /// in that case.
    pub async fn join(&self, player: PlayerId) -> Result<(), RoundError> {
        self.request(|reply| RoundCommand::Join { player, reply })
            .await?
    }

    /// Removes a player from the round.
    pub async fn leave(&self, player: PlayerId) -> Result<(), RoundError> {
        self.request(|reply| RoundCommand::Leave { player, reply })
            .await?
    }

    /// Signals that a player has won; ends the round when Playing.
    pub async fn player_won(&self, player: PlayerId) -> Result<(), RoundError> {
        self.send(RoundCommand::PlayerWon { player }).await
    }

    /// Re-teleports a respawning player to their claimed spawn point.
    pub async fn respawn(&self, player: PlayerId) -> Result<(), RoundError> {
        self.send(RoundCommand::Respawn { player }).await
    }

    pub async fn register_service(
        &self,
        service: Box<dyn GameService>,
    ) -> Result<(), RoundError> {
        self.request(|reply| RoundCommand::RegisterService { service, reply })
            .await?
    }

    pub async fn unregister_service(&self, id: &str) -> Result<(), RoundError> {
        let id = id.to_string();
        self.request(|reply| RoundCommand::UnregisterService { id, reply })
            .await?
    }

    /// Adds a spawn point; returns its generated id.
    pub async fn add_spawn_point(
        &self,
        position: Vec3,
        name: Option<String>,
        world: Option<String>,
        metadata: BTreeMap<String, String>,
        priority: i32,
        kind: String,
    ) -> Result<SpawnPointId, RoundError> {
        self.request(|reply| {
            RoundCommand::Spawn(SpawnOp::Add {
                position,
                name,
                world,
                metadata,
                priority,
                kind,
                reply,
            })
        })
        .await
    }

    pub async fn remove_spawn_point(&self, id: SpawnPointId) -> Result<bool, RoundError> {
        self.request(|reply| RoundCommand::Spawn(SpawnOp::Remove { id, reply }))
            .await
    }

    pub async fn update_spawn_point(
        &self,
        id: SpawnPointId,
        patch: SpawnPatch,
    ) -> Result<bool, RoundError> {
        self.request(|reply| RoundCommand::Spawn(SpawnOp::Update { id, patch, reply }))
            .await
    }

    pub async fn get_spawn_point(
        &self,
        id: SpawnPointId,
    ) -> Result<Option<SpawnPoint>, RoundError> {
        self.request(|reply| RoundCommand::Spawn(SpawnOp::Get { id, reply }))
            .await
    }

    pub async fn list_spawn_points(&self) -> Result<Vec<SpawnPoint>, RoundError> {
        self.request(|reply| RoundCommand::Spawn(SpawnOp::List { reply }))
            .await
    }

    /// Drops every spawn point. The caller is expected to have
    /// confirmed intent; this is irreversible.
    pub async fn clear_spawn_points(&self) -> Result<(), RoundError> {
        self.request(|reply| RoundCommand::Spawn(SpawnOp::Clear { reply }))
            .await
    }

    pub async fn best_spawn_point(
        &self,
        world: Option<String>,
        kind: Option<String>,
    ) -> Result<Option<SpawnPoint>, RoundError> {
        self.request(|reply| RoundCommand::Spawn(SpawnOp::Best { world, kind, reply }))
            .await
    }

    pub async fn import_spawn_points(
        &self,
        records: Vec<SpawnRecord>,
        overwrite: bool,
    ) -> Result<usize, RoundError> {
        self.request(|reply| {
            RoundCommand::Spawn(SpawnOp::Import {
                records,
                overwrite,
                reply,
            })
        })
        .await
    }

    pub async fn export_spawn_points(&self) -> Result<Vec<SpawnRecord>, RoundError> {
        self.request(|reply| RoundCommand::Spawn(SpawnOp::Export { reply }))
            .await
    }

    /// Snapshot of round metadata.
    pub async fn info(&self) -> Result<RoundInfo, RoundError> {
        self.request(|reply| RoundCommand::Info { reply }).await
    }

    /// Pulls the current display values (the core never pushes these).
    pub async fn display(&self) -> Result<DisplayValues, RoundError> {
        self.request(|reply| RoundCommand::Display { reply }).await
    }

    /// Tells the round actor to stop services, cancel timers, and exit.
    pub async fn shutdown(&self) -> Result<(), RoundError> {
        self.send(RoundCommand::Shutdown).await
    }
}

/// The round actor state. Runs inside a Tokio task.
struct RoundActor {
    config: RoundConfig,
    state: RoundState,
    players: HashSet<PlayerId>,
    joined_count: usize,
    /// Spawn point handed to each player this round, for respawns.
    claimed: HashMap<PlayerId, Vec3>,
    started_at: Option<Instant>,
    round_won: bool,
    winner: Option<PlayerId>,
    store: SpawnStore,
    services: ServiceRegistry,
    directory: Box<dyn PlayerDirectory>,
    countdown_left: u64,
    post_game_left: u64,
    countdown_timer: Option<TimerHandle>,
    update_timer: Option<TimerHandle>,
    post_game_timer: Option<TimerHandle>,
    cmd_rx: mpsc::Receiver<RoundCommand>,
    tick_rx: mpsc::Receiver<TickKind>,
    tick_tx: mpsc::Sender<TickKind>,
}

impl RoundActor {
    async fn run(mut self) {
        info!(required = self.config.required_players, "round controller started");

        loop {
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(RoundCommand::Shutdown) | None => {
                        self.handle_shutdown();
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd),
                },
                Some(kind) = self.tick_rx.recv() => self.handle_tick(kind),
            }
        }

        info!("round controller stopped");
    }

    fn handle_command(&mut self, cmd: RoundCommand) {
        match cmd {
            RoundCommand::Join { player, reply } => {
                let _ = reply.send(self.handle_join(player));
            }
            RoundCommand::Leave { player, reply } => {
                let _ = reply.send(self.handle_leave(player));
            }
            RoundCommand::PlayerWon { player } => self.handle_player_won(player),
            RoundCommand::Respawn { player } => self.handle_respawn(player),
            RoundCommand::RegisterService { service, reply } => {
                let _ = reply.send(self.services.register(service).map_err(RoundError::from));
            }
            RoundCommand::UnregisterService { id, reply } => {
                let _ = reply.send(self.services.unregister(&id).map_err(RoundError::from));
            }
            RoundCommand::Spawn(op) => self.handle_spawn_op(op),
            RoundCommand::Info { reply } => {
                let _ = reply.send(self.snapshot());
            }
            RoundCommand::Display { reply } => {
                let _ = reply.send(self.display_values());
            }
            RoundCommand::Shutdown => unreachable!("handled in run()"),
        }
    }

    fn handle_tick(&mut self, kind: TickKind) {
        match kind {
            TickKind::Countdown => self.handle_countdown_tick(),
            TickKind::Update => self.handle_update_tick(),
            TickKind::PostGame => self.handle_post_game_tick(),
        }
    }

    // -- join / leave -------------------------------------------------------

    fn handle_join(&mut self, player: PlayerId) -> Result<(), RoundError> {
        if !self.state.is_joinable() {
            // A round past Waiting is a hard rejection, not a queue.
            self.directory.kick(player, "The round has already started.");
            return Err(RoundError::RoundInProgress);
        }
        if !self.players.insert(player) {
            return Err(RoundError::AlreadyJoined(player));
        }

        self.joined_count += 1;
        let lobby = self.config.lobby_world.clone();
        self.directory.teleport(player, &lobby, None);
        self.directory
            .send_message(player, "Waiting for other players to join...");

        info!(%player, joined = self.joined_count, "player joined");

        if self.joined_count >= self.config.required_players {
            self.begin_countdown();
        }
        Ok(())
    }

    fn handle_leave(&mut self, player: PlayerId) -> Result<(), RoundError> {
        if !self.players.remove(&player) {
            return Err(RoundError::NotJoined(player));
        }

        if self.joined_count > 0 {
            self.joined_count -= 1;
        }
        self.claimed.remove(&player);

        info!(%player, joined = self.joined_count, "player left");

        // The only path that cancels the post-game countdown early.
        if self.state == RoundState::Ended && self.joined_count == 0 {
            info!("all players left during post-game, resetting");
            self.reset();
        }
        Ok(())
    }

    fn handle_player_won(&mut self, player: PlayerId) {
        if self.state != RoundState::Playing {
            warn!(%player, state = %self.state, "win signal outside Playing ignored");
            return;
        }
        self.round_won = true;
        self.winner = Some(player);
        info!(%player, "round won");
        self.end_round();
    }

    fn handle_respawn(&mut self, player: PlayerId) {
        if self.state != RoundState::Playing {
            return;
        }
        if let Some(&position) = self.claimed.get(&player) {
            let world = self.config.game_world.clone();
            self.directory.teleport(player, &world, Some(position));
        }
    }

    // -- phase transitions ----------------------------------------------------

    /// Moves the state machine along its cycle. Every transition in the
    /// actor follows a documented edge; an off-cycle move is a logic
    /// error, logged rather than panicking.
    fn enter(&mut self, next: RoundState) {
        if !self.state.can_transition_to(next) {
            warn!(from = %self.state, to = %next, "state transition off the documented cycle");
        }
        self.state = next;
    }

    fn begin_countdown(&mut self) {
        self.enter(RoundState::Starting);
        self.countdown_left = self.config.countdown.as_secs();

        if let Some(timer) = self.countdown_timer.take() {
            timer.cancel();
        }
        self.countdown_timer = Some(spawn_repeating(
            self.config.tick_interval,
            self.tick_tx.clone(),
            TickKind::Countdown,
        ));

        info!(seconds = self.countdown_left, "start countdown scheduled");
    }

    fn handle_countdown_tick(&mut self) {
        if self.state != RoundState::Starting {
            // Stale tick after a reset.
            if let Some(timer) = self.countdown_timer.take() {
                timer.cancel();
            }
            return;
        }

        if self.countdown_left > 0 {
            let msg = format!("Game starts in {} seconds!", self.countdown_left);
            for player in self.directory.list_online() {
                self.directory.send_message(player, &msg);
            }
            self.countdown_left -= 1;
        }

        if self.countdown_left == 0 {
            if let Some(timer) = self.countdown_timer.take() {
                timer.cancel();
            }
            self.start_round();
        }
    }

    fn start_round(&mut self) {
        self.store.repopulate_pool();
        if self.store.pool_len() == 0 {
            warn!("no spawn points configured, players may not spawn correctly");
        }

        let game_world = self.config.game_world.clone();
        let players: Vec<PlayerId> = self.players.iter().copied().collect();
        for player in players {
            match self.store.claim() {
                Some(position) => {
                    self.claimed.insert(player, position);
                    self.directory.teleport(player, &game_world, Some(position));
                    self.directory.send_message(player, "The round has started!");
                }
                None => {
                    warn!(%player, "no unclaimed spawn point available");
                    self.directory.send_message(player, "No spawn point available!");
                }
            }
        }

        self.started_at = Some(Instant::now());

        if let Some(timer) = self.update_timer.take() {
            timer.cancel();
        }
        self.update_timer = Some(spawn_repeating(
            self.config.tick_interval,
            self.tick_tx.clone(),
            TickKind::Update,
        ));

        self.enter(RoundState::Playing);
        self.services.start_all();

        info!(players = self.players.len(), "round started");
    }

    fn handle_update_tick(&mut self) {
        // A tick that raced end_round's cancellation.
        if self.state != RoundState::Playing {
            return;
        }

        if self.joined_count == 0 {
            info!("all players left during the round, ending");
            self.end_round();
            return;
        }

        if let Some(started_at) = self.started_at {
            if started_at.elapsed() >= self.config.max_round_time {
                info!("round time is up");
                self.end_round();
                return;
            }
        }

        self.services.update_all();
    }

    /// Ends the round. Idempotent: a second call in the same round is a
    /// no-op, so a win signal and a timeout can never double-schedule
    /// the post-game countdown.
    fn end_round(&mut self) {
        if self.state == RoundState::Ended {
            return;
        }
        self.enter(RoundState::Ended);

        if let Some(timer) = self.update_timer.take() {
            timer.cancel();
        }
        self.services.stop_all();

        let victory_world = self.config.victory_world.clone();
        let players: Vec<PlayerId> = self.players.iter().copied().collect();
        for player in players {
            self.directory.teleport(player, &victory_world, None);
            self.directory.send_message(player, "The round has ended!");
            let title = if self.round_won && self.winner == Some(player) {
                "You won!"
            } else {
                "You lost!"
            };
            self.directory.send_title(player, title);
        }

        self.post_game_left = self.config.post_game_wait.as_secs();
        if let Some(timer) = self.post_game_timer.take() {
            timer.cancel();
        }
        self.post_game_timer = Some(spawn_repeating(
            self.config.tick_interval,
            self.tick_tx.clone(),
            TickKind::PostGame,
        ));

        info!(seconds = self.post_game_left, "post-game countdown started");
    }

    fn handle_post_game_tick(&mut self) {
        if self.state != RoundState::Ended {
            if let Some(timer) = self.post_game_timer.take() {
                timer.cancel();
            }
            return;
        }

        if self.config.warning_checkpoints.contains(&self.post_game_left) {
            let msg = if self.post_game_left == 1 {
                "Server resets in 1 second!".to_string()
            } else {
                format!("Server resets in {} seconds!", self.post_game_left)
            };
            let players: Vec<PlayerId> = self.players.iter().copied().collect();
            for player in players {
                self.directory.send_title(player, &msg);
            }
        }

        self.post_game_left = self.post_game_left.saturating_sub(1);
        if self.post_game_left == 0 {
            info!("post-game wait finished, resetting");
            let players: Vec<PlayerId> = self.players.iter().copied().collect();
            for player in players {
                self.directory.kick(
                    player,
                    "Round over! The server is resetting for the next round. Rejoin to play again!",
                );
            }
            self.reset();
        }
    }

    /// Returns the controller to Waiting. Cancels every outstanding
    /// timer and clears all per-round state; the persisted spawn set is
    /// untouched.
    fn reset(&mut self) {
        for timer in [
            self.countdown_timer.take(),
            self.update_timer.take(),
            self.post_game_timer.take(),
        ]
        .into_iter()
        .flatten()
        {
            timer.cancel();
        }

        self.players.clear();
        self.claimed.clear();
        self.joined_count = 0;
        self.started_at = None;
        self.round_won = false;
        self.winner = None;
        self.countdown_left = 0;
        self.post_game_left = 0;
        self.store.clear_pool();
        self.enter(RoundState::Waiting);

        info!("round reset to waiting state");
    }

    fn handle_shutdown(&mut self) {
        for timer in [
            self.countdown_timer.take(),
            self.update_timer.take(),
            self.post_game_timer.take(),
        ]
        .into_iter()
        .flatten()
        {
            timer.cancel();
        }
        self.services.stop_all();
        info!("round controller shutting down");
    }

    // -- queries ------------------------------------------------------------

    fn snapshot(&self) -> RoundInfo {
        RoundInfo {
            state: self.state,
            joined_count: self.joined_count,
            players: self.players.iter().copied().collect(),
            winner: self.winner.filter(|_| self.round_won),
            services: self.services.len(),
            pool_remaining: self.store.pool_len(),
        }
    }

    fn display_values(&self) -> DisplayValues {
        let time_left = match (self.state, self.started_at) {
            (RoundState::Playing, Some(started_at)) => {
                let remaining = self.config.max_round_time.saturating_sub(started_at.elapsed());
                let secs = remaining.as_secs();
                Some(format!("{}:{:02}", secs / 60, secs % 60))
            }
            _ => None,
        };

        if self.state != RoundState::Ended {
            return DisplayValues {
                time_left,
                ..DisplayValues::default()
            };
        }

        let finish_text = if self.round_won && self.winner.is_some() {
            "Winner"
        } else {
            "Round Over"
        };
        let finish_reason = match self.winner {
            Some(winner) if self.round_won => self.directory.display_name(winner),
            _ => "Time is up!".to_string(),
        };

        DisplayValues {
            time_left,
            finish_text: Some(finish_text.to_string()),
            finish_reason: Some(finish_reason),
            reset_countdown: Some(format!("Reset in: {}s", self.post_game_left)),
        }
    }

    fn handle_spawn_op(&mut self, op: SpawnOp) {
        match op {
            SpawnOp::Add {
                position,
                name,
                world,
                metadata,
                priority,
                kind,
                reply,
            } => {
                let id = self.store.add(position, name, world, metadata, priority, kind);
                let _ = reply.send(id);
            }
            SpawnOp::Remove { id, reply } => {
                let _ = reply.send(self.store.remove(&id));
            }
            SpawnOp::Update { id, patch, reply } => {
                let _ = reply.send(self.store.update(&id, patch));
            }
            SpawnOp::Get { id, reply } => {
                let _ = reply.send(self.store.get(&id).cloned());
            }
            SpawnOp::List { reply } => {
                let _ = reply.send(self.store.list().to_vec());
            }
            SpawnOp::Clear { reply } => {
                self.store.clear();
                let _ = reply.send(());
            }
            SpawnOp::Best { world, kind, reply } => {
                let best = self
                    .store
                    .best(world.as_deref(), kind.as_deref())
                    .cloned();
                let _ = reply.send(best);
            }
            SpawnOp::Import {
                records,
                overwrite,
                reply,
            } => {
                let _ = reply.send(self.store.import(records, overwrite));
            }
            SpawnOp::Export { reply } => {
                let _ = reply.send(self.store.export());
            }
        }
    }
}

/// Spawns the round actor task and returns a handle to it.
pub fn spawn_round(
    config: RoundConfig,
    store: SpawnStore,
    directory: Box<dyn PlayerDirectory>,
) -> RoundHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_SIZE);
    let (tick_tx, tick_rx) = mpsc::channel(CHANNEL_SIZE);

    let actor = RoundActor {
        config,
        state: RoundState::Waiting,
        players: HashSet::new(),
        joined_count: 0,
        claimed: HashMap::new(),
        started_at: None,
        round_won: false,
        winner: None,
        store,
        services: ServiceRegistry::new(),
        directory,
        countdown_left: 0,
        post_game_left: 0,
        countdown_timer: None,
        update_timer: None,
        post_game_timer: None,
        cmd_rx,
        tick_rx,
        tick_tx,
    };

    tokio::spawn(actor.run());

    RoundHandle { sender: cmd_tx }
}
