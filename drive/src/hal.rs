//! Platform boundary: gate outputs and the monotonic clock
//!
//! Pins are read through [`embedded_hal::digital::InputPin`] and all sleeps go
//! through [`embedded_hal::delay::DelayNs`]; only the half-bridge outputs and
//! the millisecond clock need traits of their own.

use crate::phase::Phase;

/// Half-bridge gate outputs for the three phases
pub trait PhaseDriver {
    /// Drive the high-side switch of `phase`.
    ///
    /// `on = false` must leave the gate in its off state (floating input with
    /// external pull resistors on the reference hardware).
    fn set_high_side(&mut self, phase: Phase, on: bool);

    /// Enable low-side PWM on `phase` at `duty`, or disable it and release the pin.
    fn set_low_side_pwm(&mut self, phase: Phase, enabled: bool, duty: u16);

    /// Full-scale duty value
    fn max_duty(&self) -> u16;
}

/// Wrapping millisecond clock
pub trait Monotonic {
    fn now_ms(&mut self) -> u32;
}
