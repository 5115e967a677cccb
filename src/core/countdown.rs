//! Expiration countdown for a quote

use chrono::{DateTime, Utc};
use std::fmt::Display;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remaining {
    Running { minutes: u64, seconds: u64 },
    Expired,
}

impl Remaining {
    pub fn from_duration(left: Duration) -> Self {
        if left.is_zero() {
            return Remaining::Expired;
        }
        let total = left.as_secs();
        Remaining::Running {
            minutes: total / 60,
            seconds: total % 60,
        }
    }

    /// Time left between `now` and `expiration`, against the wall clock.
    pub fn between(expiration: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self::from_duration(time_left(expiration, now))
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, Remaining::Expired)
    }
}

fn time_left(expiration: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (expiration - now).to_std().unwrap_or(Duration::ZERO)
}

impl Display for Remaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Remaining::Running { minutes, seconds } => {
                write!(f, "Válido por {minutes} minutos y {seconds} segundos")
            }
            Remaining::Expired => f.write_str("Expirado"),
        }
    }
}

/// A reading emitted by a running countdown, tagged with the expiration it
/// counts towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub expiration: DateTime<Utc>,
    pub remaining: Remaining,
}

/// Ticking countdown owned by whoever displays it. Dropping it stops the timer.
pub struct Countdown {
    expiration: DateTime<Utc>,
    task: JoinHandle<()>,
}

impl Countdown {
    /// Starts counting towards `expiration`, returning the initial reading right
    /// away. Later readings are sent on `ticks` every `tick` until `Expired`.
    pub fn start(
        expiration: DateTime<Utc>,
        tick: Duration,
        ticks: mpsc::UnboundedSender<Tick>,
    ) -> (Self, Remaining) {
        let now = Utc::now();
        let left = time_left(expiration, now);
        let initial = Remaining::between(expiration, now);
        // The wall clock is read once; ticks follow the monotonic clock.
        let deadline = Instant::now() + left;

        let task = tokio::spawn(async move {
            if initial.is_expired() {
                return;
            }
            let mut interval = tokio::time::interval_at(Instant::now() + tick, tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                let now = interval.tick().await;
                let remaining = Remaining::from_duration(deadline.saturating_duration_since(now));
                if ticks
                    .send(Tick {
                        expiration,
                        remaining,
                    })
                    .is_err()
                    || remaining.is_expired()
                {
                    break;
                }
            }
        });

        (Self { expiration, task }, initial)
    }

    pub fn expiration(&self) -> DateTime<Utc> {
        self.expiration
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.task.abort();
    }
}
