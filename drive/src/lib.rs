#![cfg_attr(not(any(test, feature = "std")), no_std)]
//! # Open-loop 6-step BLDC drive
//!
//! Hardware-independent core of a trapezoidal brushless motor drive:
//!
//! *   [`Commutator`] moves the three half-bridges through the 6-step sequence,
//!     separating every switch transition with a software deadtime so that no
//!     leg ever conducts high and low at once.
//! *   [`SafetyMonitor`] folds the emergency-stop (active-low) and fault
//!     (active-high) inputs into a single fault condition.
//! *   [`ButtonInput`] debounces the two speed buttons and auto-repeats while
//!     they are held.
//! *   [`ControlLoop`] ties it together: step, dwell, poll, and halt on fault
//!     until the inputs clear.
//!
//! The platform supplies a [`PhaseDriver`], a [`Monotonic`] clock, a blocking
//! [`embedded_hal::delay::DelayNs`] and [`embedded_hal::digital::InputPin`]s.
//!
//! ```rust,no_run
//! # use sixstep_drive::{Board, ControlLoop, DriveConfig, SafetyMonitor};
//! # fn run<D, T, C, P>(driver: D, delay: T, clock: C, estop: P, fault: P, faster: P, slower: P) -> !
//! # where D: sixstep_drive::PhaseDriver, T: embedded_hal::delay::DelayNs,
//! #       C: sixstep_drive::Monotonic, P: embedded_hal::digital::InputPin {
//! let board = Board {
//!     driver,
//!     delay,
//!     clock,
//!     safety: SafetyMonitor::new(estop, fault),
//!     faster,
//!     slower,
//! };
//! let mut control = match ControlLoop::new(DriveConfig::default(), board) {
//!     Ok(control) => control,
//!     Err(e) => panic!("{}", e),
//! };
//! control.run()
//! # }
//! ```
//!
//! ## Features
//!
//! *   `defmt` / `log`: route internal logging to one of these backends.
//! *   `std`: build against the standard library.

#[macro_use]
pub(crate) mod fmt;

pub mod button;
pub mod commutation;
pub mod config;
pub mod control;
pub mod hal;
pub mod phase;
pub mod safety;
pub mod six_step;

#[cfg(test)]
pub(crate) mod mock;

pub use button::{ButtonInput, Debounce};
pub use commutation::{Commutator, MotorState, StepOutcome};
pub use config::{ConfigError, DriveConfig};
pub use control::{Board, ControlLoop, LoopState, StatusObserver};
pub use hal::{Monotonic, PhaseDriver};
pub use phase::Phase;
pub use safety::{FaultSource, SafetyMonitor};
pub use six_step::CommutationStep;
