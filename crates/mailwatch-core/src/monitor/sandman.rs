//! Interruptible sleep between cycles.

use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

/// Creates a connected stop handle and signal.
#[must_use]
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx: Some(rx) })
}

/// Requests a monitor to stop.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    /// Signals every connected [`StopSignal`].
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Cooperative stop flag observed by the monitor loop.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl StopSignal {
    /// A signal that never fires.
    #[must_use]
    pub const fn never() -> Self {
        Self { rx: None }
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Completes once a stop is requested.
    ///
    /// Pends forever if the handle was dropped without stopping.
    pub async fn stopped(&mut self) {
        let Some(rx) = self.rx.as_mut() else {
            return std::future::pending().await;
        };
        let closed = rx.wait_for(|stopped| *stopped).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

/// How a sleep ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepOutcome {
    /// The full interval elapsed.
    Completed,
    /// A stop was requested.
    Stopped,
}

/// Sleeps for an interval in rounds, checking the stop signal each round.
#[derive(Debug, Clone, Copy)]
pub struct Sandman {
    interval: Duration,
    round: Duration,
}

impl Sandman {
    /// Creates a sandman. A zero round is treated as one round per interval.
    #[must_use]
    pub fn new(interval: Duration, round: Duration) -> Self {
        let round = if round.is_zero() { interval } else { round };
        Self { interval, round }
    }

    /// Total sleep per cycle.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleeps for the interval unless `stop` fires first.
    pub async fn sleep_in_rounds(&self, stop: &mut StopSignal) -> SleepOutcome {
        let mut remaining = self.interval;
        debug!(secs = remaining.as_secs(), "sleeping");
        while !remaining.is_zero() {
            if stop.is_stopped() {
                return SleepOutcome::Stopped;
            }
            let step = remaining.min(self.round);
            tokio::select! {
                () = tokio::time::sleep(step) => {}
                () = stop.stopped() => return SleepOutcome::Stopped,
            }
            remaining = remaining.saturating_sub(step);
            debug!(remaining_secs = remaining.as_secs(), "sleep round finished");
        }
        if stop.is_stopped() {
            SleepOutcome::Stopped
        } else {
            SleepOutcome::Completed
        }
    }
}
