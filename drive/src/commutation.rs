//! Deadtime-safe execution of a single commutation step

use embedded_hal::delay::DelayNs;

use crate::hal::PhaseDriver;
use crate::phase::Phase;
use crate::safety::FaultSource;
use crate::six_step::CommutationStep;

/// Electrical and timing state of the motor
///
/// Owned by the control loop. The commutator writes the electrical fields,
/// the loop writes the step, duty and period.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorState {
    /// Phase whose high-side switch is currently on
    pub high_side: Option<Phase>,
    /// Phase whose low-side PWM is currently enabled
    pub low_side: Option<Phase>,
    /// Next step to drive
    pub step: CommutationStep,
    /// Low-side duty, 0..=driver max duty
    pub pwm_level: u16,
    /// Dwell time per step
    pub step_period_ms: u32,
}

impl MotorState {
    pub fn new(pwm_level: u16, step_period_ms: u32) -> Self {
        Self {
            high_side: None,
            low_side: None,
            step: CommutationStep::Step0,
            pwm_level,
            step_period_ms,
        }
    }

    /// No switch is conducting
    pub fn is_idle(&self) -> bool {
        self.high_side.is_none() && self.low_side.is_none()
    }
}

/// Result of [`Commutator::commutate_step`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepOutcome {
    /// The step's phase pair is now driven
    Applied,
    /// A fault was active; all phases were forced off and nothing advanced
    Faulted,
}

/// Drives the half-bridges through one step at a time with software deadtime.
pub struct Commutator<D> {
    driver: D,
    dead_time_us: u32,
}

impl<D: PhaseDriver> Commutator<D> {
    pub fn new(driver: D, dead_time_us: u32) -> Self {
        Self {
            driver,
            dead_time_us,
        }
    }

    pub fn max_duty(&self) -> u16 {
        self.driver.max_duty()
    }

    /// Force every phase into the safe state: high-side floating, low-side PWM off at zero duty.
    pub fn all_off(&mut self, motor: &mut MotorState) {
        for phase in Phase::ALL {
            self.driver.set_high_side(phase, false);
            self.driver.set_low_side_pwm(phase, false, 0);
        }
        motor.high_side = None;
        motor.low_side = None;
    }

    /// Move the bridge to `step`, driving the low side at `duty`.
    ///
    /// The outgoing low side is released before any high side changes, and the
    /// incoming low side is enabled only after its high side is on. Each
    /// transition is separated by the deadtime. `motor.step` is never touched,
    /// so a faulted step is retried as-is once the fault clears.
    pub fn commutate_step<S, T>(
        &mut self,
        motor: &mut MotorState,
        step: CommutationStep,
        duty: u16,
        safety: &mut S,
        delay: &mut T,
    ) -> StepOutcome
    where
        S: FaultSource,
        T: DelayNs,
    {
        if safety.is_fault_active() {
            self.all_off(motor);
            return StepOutcome::Faulted;
        }

        let high = step.high_side();
        let low = step.low_side();
        let duty = duty.min(self.driver.max_duty());

        if let Some(phase) = motor.low_side.take() {
            self.driver.set_low_side_pwm(phase, false, 0);
        }
        delay.delay_us(self.dead_time_us);

        for phase in Phase::ALL.into_iter().filter(|p| *p != high) {
            self.driver.set_high_side(phase, false);
        }
        if motor.high_side != Some(high) {
            motor.high_side = None;
        }
        delay.delay_us(self.dead_time_us);

        self.driver.set_high_side(high, true);
        motor.high_side = Some(high);
        delay.delay_us(self.dead_time_us);

        self.driver.set_low_side_pwm(low, true, duty);
        motor.low_side = Some(low);

        trace!("step {} -> {}+ {}-", step.as_u8(), high, low);
        StepOutcome::Applied
    }
}
