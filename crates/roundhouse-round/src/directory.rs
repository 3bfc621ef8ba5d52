//! The `PlayerDirectory` trait: the round controller's window onto the
//! hosting server's players.
//!
//! Everything here is fire-and-forget from the core's perspective —
//! teleports and messages are handed off and assumed delivered. The
//! host (a real game server, or a test double) supplies the
//! implementation at engine construction.

use roundhouse_types::{PlayerId, Vec3};

/// Injected collaborator for everything player-facing.
pub trait PlayerDirectory: Send + 'static {
    /// Moves a player to `world`. With `position = None` the player
    /// lands at the world's own spawn location.
    fn teleport(&mut self, player: PlayerId, world: &str, position: Option<Vec3>);

    /// Sends a chat-style message to one player.
    fn send_message(&mut self, player: PlayerId, text: &str);

    /// Sends a title-style (prominent, transient) message to one player.
    fn send_title(&mut self, player: PlayerId, text: &str);

    /// Hard-removes a player from the server with a reason.
    fn kick(&mut self, player: PlayerId, reason: &str);

    /// Every player currently online, joined or not (the start
    /// countdown is broadcast to all of them).
    fn list_online(&self) -> Vec<PlayerId>;

    /// Human-readable name for results display. Defaults to the id.
    fn display_name(&self, player: PlayerId) -> String {
        player.to_string()
    }
}
