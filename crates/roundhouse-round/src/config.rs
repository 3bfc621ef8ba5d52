//! Round configuration and lifecycle state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoundConfig
// ---------------------------------------------------------------------------

/// Immutable configuration for the round controller, set once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Players needed in the lobby before the start countdown begins.
    pub required_players: usize,

    /// Length of the start countdown.
    pub countdown: Duration,

    /// Maximum round duration; the round ends when this elapses.
    pub max_round_time: Duration,

    /// How long the results screen stays up before the auto-reset.
    pub post_game_wait: Duration,

    /// Period of all three repeating timers (countdown, round update,
    /// post-game countdown).
    pub tick_interval: Duration,

    /// World players wait in before the round starts.
    pub lobby_world: String,

    /// World the round is played in; spawn claims teleport here.
    pub game_world: String,

    /// World players see the results in.
    pub victory_world: String,

    /// Post-game seconds at which a reset warning is shown.
    pub warning_checkpoints: Vec<u64>,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            required_players: 2,
            countdown: Duration::from_secs(5),
            max_round_time: Duration::from_secs(300),
            post_game_wait: Duration::from_secs(30),
            tick_interval: Duration::from_secs(1),
            lobby_world: "lobby".to_string(),
            game_world: "game".to_string(),
            victory_world: "victory".to_string(),
            warning_checkpoints: vec![30, 20, 10, 5, 4, 3, 2, 1],
        }
    }
}

impl RoundConfig {
    /// Checks the configuration is usable before the controller is
    /// entered with it.
    pub fn validate(&self) -> Result<(), String> {
        if self.required_players == 0 {
            return Err("required_players must be at least 1".to_string());
        }
        if self.tick_interval.is_zero() {
            return Err("tick_interval must be non-zero".to_string());
        }
        if self.max_round_time.is_zero() {
            return Err("max_round_time must be non-zero".to_string());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RoundState
// ---------------------------------------------------------------------------

/// The lifecycle state of the round.
///
/// Transitions are monotonic within one round; reset is the only way
/// back:
///
/// ```text
/// Waiting → Starting → Playing → Ended → (reset) → Waiting
/// ```
///
/// - **Waiting**: Gathering players. The only state that accepts joins.
/// - **Starting**: Enough players; the start countdown is running.
/// - **Playing**: The round is live; services tick and the clock runs.
/// - **Ended**: Results are up; the post-game countdown is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundState {
    Waiting,
    Starting,
    Playing,
    Ended,
}

impl RoundState {
    /// Whether new players may join. A round that has begun its
    /// countdown is already closed.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// The next state along the cycle.
    pub fn next(self) -> Self {
        match self {
            Self::Waiting => Self::Starting,
            Self::Starting => Self::Playing,
            Self::Playing => Self::Ended,
            Self::Ended => Self::Waiting,
        }
    }

    /// Whether moving to `target` follows the documented edges.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == target
    }
}

impl std::fmt::Display for RoundState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Waiting => write!(f, "Waiting"),
            Self::Starting => write!(f, "Starting"),
            Self::Playing => write!(f, "Playing"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}
