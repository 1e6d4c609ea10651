//! Two-phase signal simulation over a blocking in-process queue.
//!
//! A [`TrafficLight`] runs a background producer thread that toggles between
//! [`Phase::Red`] and [`Phase::Green`] on a randomized interval and publishes
//! every transition through a [`sync::queue::BlockingQueue`]. Any number of
//! waiter threads can block in [`TrafficLight::wait_for_green`] until the
//! light turns green.
//!
//! # Example
//!
//! ```no_run
//! use stoplight::{LightConfig, TrafficLight};
//!
//! let mut light = TrafficLight::new(LightConfig::default()).unwrap();
//! light.simulate();
//!
//! // Blocks until the producer publishes a green transition.
//! light.wait_for_green();
//!
//! light.shutdown();
//! ```

pub mod light;
pub mod sync;
mod trace;

#[doc(inline)]
pub use light::{IntervalPolicy, LightConfig, LightError, Phase, TrafficLight};

pub use trace::init_tracing;
