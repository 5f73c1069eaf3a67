//! Simulated work delays.
//!
//! Each stage sleeps for a duration drawn uniformly from a configured
//! millisecond range. Durations come from a caller-owned generator, so a
//! seeded generator reproduces the same sequence of sleeps.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An inclusive millisecond range to draw delays from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayRange {
    /// Lower bound in milliseconds.
    pub min_ms: u64,
    /// Upper bound in milliseconds.
    pub max_ms: u64,
}

impl DelayRange {
    /// Creates a new range. Bounds given in reverse are swapped.
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        if min_ms <= max_ms {
            Self { min_ms, max_ms }
        } else {
            Self {
                min_ms: max_ms,
                max_ms: min_ms,
            }
        }
    }

    /// A range that never sleeps.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    /// Draws a duration from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.max_ms <= self.min_ms {
            return Duration::from_millis(self.min_ms);
        }
        let ms = rng.gen_range(self.min_ms as f64..=self.max_ms as f64);
        Duration::from_secs_f64(ms / 1000.0)
    }
}

/// Delay ranges for each phase of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Pause after the starting event.
    pub setup: DelayRange,
    /// Pause inside each workflow stage.
    pub work: DelayRange,
    /// Pause inside each vision check.
    pub vision: DelayRange,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            setup: DelayRange::new(200, 500),
            work: DelayRange::new(400, 900),
            vision: DelayRange::new(250, 650),
        }
    }
}

impl TimingConfig {
    /// Creates the default timing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Timing with every delay set to zero.
    #[must_use]
    pub const fn instant() -> Self {
        Self {
            setup: DelayRange::zero(),
            work: DelayRange::zero(),
            vision: DelayRange::zero(),
        }
    }

    /// Sets the setup range.
    #[must_use]
    pub fn with_setup(mut self, range: DelayRange) -> Self {
        self.setup = range;
        self
    }

    /// Sets the per-stage work range.
    #[must_use]
    pub fn with_work(mut self, range: DelayRange) -> Self {
        self.work = range;
        self
    }

    /// Sets the per-check vision range.
    #[must_use]
    pub fn with_vision(mut self, range: DelayRange) -> Self {
        self.vision = range;
        self
    }
}

/// Performs the simulated waits.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspends for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Records requested durations without sleeping.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    durations: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Creates a new recording sleeper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every duration requested so far.
    #[must_use]
    pub fn durations(&self) -> Vec<Duration> {
        self.durations.lock().clone()
    }

    /// Returns the sum of requested durations.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.durations.lock().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.durations.lock().push(duration);
    }
}
