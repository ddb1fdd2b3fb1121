//! Board bindings for the drive core
//!
//! Pinout (STM32G431CB):
//! - Phase A/B/C high-side gates: PB3 / PB4 / PB5 (open gate = off, external 5 V pull-ups)
//! - Phase A/B/C low-side PWM: PA8 / PA9 / PA10 (TIM1 CH1..CH3, 20 kHz)
//! - Speed buttons: PB6 faster, PB7 slower (active-low, internal pull-up)
//! - Emergency stop: PB8 (active-low, internal pull-up)
//! - Fault input: PB9 (active-high, internal pull-down)
//! - Status LED: PC6 (on while halted by a fault)

pub mod bridge;

use embassy_stm32::gpio::Output;
use embassy_time::Instant;
use sixstep_drive::{CommutationStep, Monotonic, StatusObserver};

/// Millisecond clock backed by the embassy time driver
pub struct EmbassyClock;

impl Monotonic for EmbassyClock {
    fn now_ms(&mut self) -> u32 {
        Instant::now().as_millis() as u32
    }
}

/// Lights the status LED while the drive is halted by a fault
pub struct FaultLed<'d> {
    led: Output<'d>,
}

impl<'d> FaultLed<'d> {
    pub fn new(mut led: Output<'d>) -> Self {
        led.set_low();
        Self { led }
    }
}

impl StatusObserver for FaultLed<'_> {
    fn fault_entered(&mut self, step: CommutationStep) {
        self.led.set_high();
        defmt::warn!("Drive halted at step {}", step);
    }

    fn fault_cleared(&mut self, step: CommutationStep) {
        self.led.set_low();
        defmt::info!("Drive resuming at step {}", step);
    }
}
