//! Two-phase traffic light driven by a background producer thread.
//!
//! # Architecture
//!
//! A [`TrafficLight`] owns one [`BlockingQueue<Phase>`] and spawns a single
//! producer thread:
//!
//! - **Producer thread**: toggles the phase between red and green on a
//!   randomized interval and publishes every transition to the queue.
//! - **Waiter threads**: any number of callers block in
//!   [`TrafficLight::wait_for_green`], each independently draining the queue
//!   until a green transition is observed.
//!
//! The queue is the sole channel between the two sides; FIFO delivery means
//! a waiter sees transitions in emission order, never skipped or reordered.
//!
//! # Shutdown
//!
//! The producer checks a shared shutdown flag on every loop iteration.
//! [`TrafficLight::shutdown`] sets the flag and joins the thread; dropping
//! the handle sets the flag without joining.

pub mod timing;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use minstant::Instant;
use rand::Rng;

use crate::sync::queue::BlockingQueue;
use crate::trace::{debug, info};

use self::timing::{CycleTimer, CycleWindow};

/// Throttle between two `take()` calls in [`TrafficLight::wait_for_green`].
///
/// A rate limit on spin frequency only. The actual suspension happens
/// inside [`BlockingQueue::take`] via its condvar.
const WAIT_THROTTLE: Duration = Duration::from_millis(1);

/// The two-valued state of the light.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Stop.
    Red = 0,
    /// Go.
    Green = 1,
}

impl Phase {
    /// Returns the opposite phase.
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Red => Self::Green,
            Self::Green => Self::Red,
        }
    }

    const fn to_bits(self) -> u8 {
        self as u8
    }

    const fn from_bits(bits: u8) -> Self {
        if bits == Self::Red as u8 {
            Self::Red
        } else {
            Self::Green
        }
    }
}

/// How often the producer draws a fresh cycle duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntervalPolicy {
    /// Draw one duration when the producer starts and keep it for the
    /// thread's lifetime.
    #[default]
    DrawOnce,
    /// Draw a fresh duration after every transition.
    DrawEachCycle,
}

/// Configuration for a [`TrafficLight`].
#[derive(Debug, Clone)]
pub struct LightConfig {
    /// Lower bound of the cycle duration draw, in milliseconds (inclusive).
    pub cycle_min_ms: u64,
    /// Upper bound of the cycle duration draw, in milliseconds (inclusive).
    pub cycle_max_ms: u64,
    /// Producer loop pacing interval. A throttle to avoid busy-spinning,
    /// not a scheduling mechanism; transitions are measured against elapsed
    /// time, not tick counts.
    pub tick_interval: Duration,
    /// When the cycle duration is (re)drawn.
    pub interval_policy: IntervalPolicy,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            cycle_min_ms: 4000,
            cycle_max_ms: 6000,
            tick_interval: Duration::from_millis(1),
            interval_policy: IntervalPolicy::DrawOnce,
        }
    }
}

/// Error constructing a [`TrafficLight`].
#[derive(Debug, thiserror::Error)]
pub enum LightError {
    /// The configured cycle window is empty or inverted.
    #[error("invalid cycle window: [{min_ms}, {max_ms}] ms")]
    InvalidCycleWindow { min_ms: u64, max_ms: u64 },
}

/// Handle to a simulated two-phase light.
///
/// Starts in [`Phase::Red`]. Call [`TrafficLight::simulate`] to start the
/// producer thread, then block in [`TrafficLight::wait_for_green`] from any
/// thread holding the handle.
pub struct TrafficLight {
    queue: Arc<BlockingQueue<Phase>>,
    phase: Arc<AtomicU8>,
    shutdown_flag: Arc<AtomicBool>,
    producer_handle: Option<JoinHandle<()>>,
    window: CycleWindow,
    tick_interval: Duration,
    interval_policy: IntervalPolicy,
}

impl TrafficLight {
    /// Creates a light in [`Phase::Red`] with no producer running.
    ///
    /// # Errors
    ///
    /// Returns [`LightError::InvalidCycleWindow`] if `cycle_min_ms` is zero
    /// or greater than `cycle_max_ms`.
    pub fn new(config: LightConfig) -> Result<Self, LightError> {
        let window = CycleWindow::new(config.cycle_min_ms, config.cycle_max_ms).ok_or(
            LightError::InvalidCycleWindow {
                min_ms: config.cycle_min_ms,
                max_ms: config.cycle_max_ms,
            },
        )?;

        Ok(Self {
            queue: Arc::new(BlockingQueue::new()),
            phase: Arc::new(AtomicU8::new(Phase::Red.to_bits())),
            shutdown_flag: Arc::new(AtomicBool::new(false)),
            producer_handle: None,
            window,
            tick_interval: config.tick_interval,
            interval_policy: config.interval_policy,
        })
    }

    /// Starts the producer thread. Returns immediately.
    ///
    /// Idempotent: a second call while the producer is running is a no-op,
    /// so a light never accumulates duplicate producers.
    ///
    /// # Panics
    ///
    /// Panics if thread spawning fails.
    pub fn simulate(&mut self) {
        if self.producer_handle.is_some() {
            debug!("simulate called again; producer already running");
            return;
        }

        let producer = Producer {
            queue: Arc::clone(&self.queue),
            phase: Arc::clone(&self.phase),
            shutdown_flag: Arc::clone(&self.shutdown_flag),
            window: self.window,
            tick_interval: self.tick_interval,
            interval_policy: self.interval_policy,
        };

        let handle = thread::Builder::new()
            .name("stoplight-producer".into())
            .spawn(move || {
                info!("producer thread started");
                producer.run();
                info!("producer thread exiting");
            })
            .expect("failed to spawn producer thread");

        self.producer_handle = Some(handle);
    }

    /// Returns the last phase written by the producer.
    ///
    /// A relaxed, best-effort read: it is not ordered against queue
    /// consumption, so a waiter that just took a transition may briefly
    /// observe the previous phase here.
    #[must_use]
    pub fn current_phase(&self) -> Phase {
        Phase::from_bits(self.phase.load(Ordering::Relaxed))
    }

    /// Blocks until the producer publishes a [`Phase::Green`] transition.
    ///
    /// Each call independently drains the queue: red transitions are
    /// consumed and discarded, and the call returns on the first green.
    pub fn wait_for_green(&self) {
        loop {
            // Pacing only; take() suspends on its condvar when empty.
            thread::sleep(WAIT_THROTTLE);
            if self.queue.take() == Phase::Green {
                return;
            }
        }
    }

    /// Shared handle to the transition stream.
    ///
    /// The producer is the only writer; consumers may `take` from it
    /// directly instead of going through [`TrafficLight::wait_for_green`].
    #[must_use]
    pub fn transitions(&self) -> &Arc<BlockingQueue<Phase>> {
        &self.queue
    }

    /// Signals the producer to stop and joins it.
    pub fn shutdown(mut self) {
        info!("light shutdown initiated");
        self.shutdown_flag.store(true, Ordering::Relaxed);

        if let Some(handle) = self.producer_handle.take() {
            let _ = handle.join();
        }

        info!("light shutdown complete");
    }
}

impl Drop for TrafficLight {
    fn drop(&mut self) {
        // Signal shutdown if not already done. Best-effort: no join here,
        // shutdown() is the graceful path.
        self.shutdown_flag.store(true, Ordering::Relaxed);
    }
}

/// State owned by the producer thread.
struct Producer {
    queue: Arc<BlockingQueue<Phase>>,
    phase: Arc<AtomicU8>,
    shutdown_flag: Arc<AtomicBool>,
    window: CycleWindow,
    tick_interval: Duration,
    interval_policy: IntervalPolicy,
}

impl Producer {
    /// Producer loop: pace, measure elapsed milliseconds, toggle and
    /// publish when the armed duration is reached.
    fn run(self) {
        let mut rng = rand::rng();
        let duration_ms = self.window.draw(&mut rng);
        debug!(duration_ms, "cycle duration drawn");

        let start = Instant::now();
        let mut timer = CycleTimer::new(0, duration_ms);

        while !self.shutdown_flag.load(Ordering::Relaxed) {
            // Throttle to avoid busy-spinning between elapsed-time checks.
            thread::sleep(self.tick_interval);

            let now_ms = start.elapsed().as_millis() as u64;
            if timer.fire(now_ms) {
                let next = Phase::from_bits(self.phase.load(Ordering::Relaxed)).toggle();
                self.phase.store(next.to_bits(), Ordering::Relaxed);
                info!(phase = ?next, elapsed_ms = now_ms, "phase transition");
                self.queue.put(next);

                rearm_after_fire(&mut timer, self.window, self.interval_policy, &mut rng);
            }
        }

        debug!("shutdown flag observed");
    }
}

/// Re-arms the cycle duration after a transition according to the interval
/// policy: `DrawOnce` keeps the duration drawn at thread start for the
/// producer's lifetime, `DrawEachCycle` replaces it with a fresh draw.
fn rearm_after_fire<R: Rng>(
    timer: &mut CycleTimer,
    window: CycleWindow,
    policy: IntervalPolicy,
    rng: &mut R,
) {
    if policy == IntervalPolicy::DrawEachCycle {
        let redrawn = window.draw(rng);
        debug!(duration_ms = redrawn, "cycle duration redrawn");
        timer.set_duration(redrawn);
    }
}
