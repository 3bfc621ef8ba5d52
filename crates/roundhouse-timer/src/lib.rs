//! Cancellable repeating timers for Roundhouse.
//!
//! The round controller needs three kinds of periodic ticks — the start
//! countdown, the per-second round update, and the post-game countdown —
//! and all three share this one abstraction: a background task that
//! delivers a message into an `mpsc` channel once per period, plus an
//! opaque handle that can cancel it.
//!
//! # Integration
//!
//! The handle's channel feeds the owning actor's `tokio::select!` loop:
//!
//! ```ignore
//! let handle = spawn_repeating(Duration::from_secs(1), tick_tx, TickKind::Update);
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         Some(kind) = tick_rx.recv() => { /* handle the tick */ }
//!     }
//! }
//! // later:
//! handle.cancel();
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, trace};

/// Handle to a running repeating timer.
///
/// Dropping the handle does **not** stop the timer; call
/// [`cancel`](Self::cancel). The timer also stops on its own when the
/// receiving end of its channel is dropped.
#[derive(Debug)]
pub struct TimerHandle {
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Cancels the timer.
    ///
    /// Synchronous and idempotent: cancelling a timer that already
    /// stopped (or was cancelled before) is a no-op.
    pub fn cancel(&self) {
        if !self.task.is_finished() {
            trace!("timer cancelled");
        }
        self.task.abort();
    }

    /// Whether the timer task has stopped, either by cancellation or
    /// because its receiver went away.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Spawns a repeating timer that sends `msg` into `sender` once per
/// `period`. The first message fires one full period after the call.
///
/// The timer stops by itself when the channel closes. For ticks the
/// message is usually a small `Copy` enum identifying the timer kind.
pub fn spawn_repeating<T>(
    period: Duration,
    sender: mpsc::Sender<T>,
    msg: T,
) -> TimerHandle
where
    T: Clone + Send + 'static,
{
    debug!(period_ms = period.as_millis() as u64, "repeating timer started");

    let task = tokio::spawn(async move {
        let mut interval = time::interval_at(Instant::now() + period, period);
        // One delivery per period even if a tick handler ran long.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if sender.send(msg.clone()).await.is_err() {
                debug!("timer receiver dropped, stopping");
                break;
            }
        }
    });

    TimerHandle { task }
}
