//! Cycle interval logic in plain millisecond counts.
//!
//! Per-thread, shared-nothing: the producer thread owns its timer and
//! window outright. Everything here is pure over `u64` milliseconds so
//! tests can drive it with a synthetic clock instead of real sleeps.
//!
//! Both sides of the elapsed comparison are milliseconds; physical time
//! only enters at the call site that converts an `Instant` into a count.

use rand::Rng;

/// Inclusive window of cycle durations to draw from, in milliseconds.
///
/// Witness type: a `CycleWindow` can only be constructed with
/// `0 < min_ms <= max_ms`, so draws never panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleWindow {
    min_ms: u64,
    max_ms: u64,
}

impl CycleWindow {
    /// Creates a window, or `None` if the bounds are empty or inverted.
    #[must_use]
    pub const fn new(min_ms: u64, max_ms: u64) -> Option<Self> {
        if min_ms > 0 && min_ms <= max_ms {
            Some(Self { min_ms, max_ms })
        } else {
            None
        }
    }

    /// Lower bound of the window, in milliseconds.
    #[must_use]
    pub const fn min_ms(self) -> u64 {
        self.min_ms
    }

    /// Upper bound of the window, in milliseconds.
    #[must_use]
    pub const fn max_ms(self) -> u64 {
        self.max_ms
    }

    /// Draws a duration uniformly from the window (inclusive on both ends).
    pub fn draw<R: Rng>(self, rng: &mut R) -> u64 {
        rng.random_range(self.min_ms..=self.max_ms)
    }
}

/// One-shot repeating timer over a millisecond clock.
///
/// `fire` compares elapsed milliseconds against the armed duration and
/// re-arms at the firing instant, so cycle boundaries never drift by the
/// caller's polling interval accumulating into the next cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleTimer {
    armed_at_ms: u64,
    duration_ms: u64,
}

impl CycleTimer {
    /// Arms a timer at `now_ms` for `duration_ms`.
    #[must_use]
    pub const fn new(now_ms: u64, duration_ms: u64) -> Self {
        Self {
            armed_at_ms: now_ms,
            duration_ms,
        }
    }

    /// Returns `true` and re-arms at `now_ms` once the armed duration has
    /// elapsed; `false` otherwise.
    pub const fn fire(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.armed_at_ms) >= self.duration_ms {
            self.armed_at_ms = now_ms;
            true
        } else {
            false
        }
    }

    /// Replaces the duration used for subsequent cycles.
    ///
    /// Takes effect from the current armed instant; the in-flight cycle is
    /// measured against the new duration.
    pub const fn set_duration(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
    }

    /// The currently armed duration, in milliseconds.
    #[must_use]
    pub const fn duration_ms(self) -> u64 {
        self.duration_ms
    }
}
