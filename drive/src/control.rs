//! Open-loop commutation control loop
//!
//! Drives one commutation step, then dwells for the step period while polling
//! the speed buttons and the safety inputs. A fault drops all phases and holds
//! the loop in [`LoopState::FaultHalted`] until the inputs clear; commutation
//! then resumes at the interrupted step with period and duty untouched.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::button::ButtonInput;
use crate::commutation::{Commutator, MotorState, StepOutcome};
use crate::config::{ConfigError, DriveConfig};
use crate::hal::{Monotonic, PhaseDriver};
use crate::safety::FaultSource;
use crate::six_step::CommutationStep;

/// Control loop operating state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoopState {
    Running,
    FaultHalted,
}

/// Notifications about loop state changes
///
/// All methods default to doing nothing.
pub trait StatusObserver {
    /// A fault stopped the drive while `step` was the next step to drive
    fn fault_entered(&mut self, _step: CommutationStep) {}
    /// The fault cleared; driving resumes at `step`
    fn fault_cleared(&mut self, _step: CommutationStep) {}
    /// A speed button moved the step period to `period_ms`
    fn step_period_changed(&mut self, _period_ms: u32) {}
}

impl StatusObserver for () {}

/// Hardware the control loop runs on
pub struct Board<D, T, C, S, P> {
    pub driver: D,
    pub delay: T,
    pub clock: C,
    pub safety: S,
    /// Shortens the step period
    pub faster: P,
    /// Lengthens the step period
    pub slower: P,
}

pub struct ControlLoop<D, T, C, S, P, O = ()> {
    config: DriveConfig,
    commutator: Commutator<D>,
    delay: T,
    clock: C,
    safety: S,
    faster: ButtonInput<P>,
    slower: ButtonInput<P>,
    observer: O,
    motor: MotorState,
    state: LoopState,
}

impl<D, T, C, S, P> ControlLoop<D, T, C, S, P>
where
    D: PhaseDriver,
    T: DelayNs,
    C: Monotonic,
    S: FaultSource,
    P: InputPin,
{
    /// Build the loop and put the bridge into the safe all-off state.
    pub fn new(config: DriveConfig, board: Board<D, T, C, S, P>) -> Result<Self, ConfigError> {
        if let Err(e) = config.validate() {
            error!("Rejected drive config: {:?}", e);
            return Err(e);
        }

        let Board {
            driver,
            delay,
            mut clock,
            safety,
            faster,
            slower,
        } = board;

        let now = clock.now_ms();
        let mut commutator = Commutator::new(driver, config.dead_time_us);
        let pwm_level = config.initial_duty(commutator.max_duty());
        let mut motor = MotorState::new(pwm_level, config.step_period_initial_ms);
        commutator.all_off(&mut motor);

        info!(
            "Drive ready: step_period={}ms duty={}/{} deadtime={}us",
            motor.step_period_ms,
            pwm_level,
            commutator.max_duty(),
            config.dead_time_us
        );

        Ok(Self {
            faster: ButtonInput::new(faster, config.debounce_ms, config.repeat_ms, now),
            slower: ButtonInput::new(slower, config.debounce_ms, config.repeat_ms, now),
            config,
            commutator,
            delay,
            clock,
            safety,
            observer: (),
            motor,
            state: LoopState::Running,
        })
    }
}

impl<D, T, C, S, P, O> ControlLoop<D, T, C, S, P, O>
where
    D: PhaseDriver,
    T: DelayNs,
    C: Monotonic,
    S: FaultSource,
    P: InputPin,
    O: StatusObserver,
{
    /// Replace the status observer
    pub fn with_observer<N: StatusObserver>(self, observer: N) -> ControlLoop<D, T, C, S, P, N> {
        ControlLoop {
            config: self.config,
            commutator: self.commutator,
            delay: self.delay,
            clock: self.clock,
            safety: self.safety,
            faster: self.faster,
            slower: self.slower,
            observer,
            motor: self.motor,
            state: self.state,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn motor(&self) -> &MotorState {
        &self.motor
    }

    /// Run forever
    pub fn run(&mut self) -> ! {
        loop {
            self.tick();
        }
    }

    /// Execute one state of the loop and return the state it leaves behind.
    ///
    /// Running: one commutation step plus its dwell. FaultHalted: hold all
    /// phases off until the safety inputs clear.
    pub fn tick(&mut self) -> LoopState {
        match self.state {
            LoopState::Running => self.drive_step(),
            LoopState::FaultHalted => self.hold_until_clear(),
        }
        self.state
    }

    fn drive_step(&mut self) {
        let step = self.motor.step;
        let duty = self.motor.pwm_level;
        let outcome = self.commutator.commutate_step(
            &mut self.motor,
            step,
            duty,
            &mut self.safety,
            &mut self.delay,
        );
        if outcome == StepOutcome::Faulted {
            self.enter_fault();
            return;
        }

        if self.dwell() {
            self.motor.step = step.next();
        } else {
            self.commutator.all_off(&mut self.motor);
            self.enter_fault();
        }
    }

    /// Wait out the step period in poll-sized slices. Returns false if a fault
    /// cut the wait short.
    fn dwell(&mut self) -> bool {
        let mut waited = 0u32;
        while waited < self.motor.step_period_ms {
            self.delay.delay_ms(self.config.poll_ms);
            waited = waited.saturating_add(self.config.poll_ms);

            self.poll_buttons();

            if self.safety.is_fault_active() {
                return false;
            }
        }
        true
    }

    fn poll_buttons(&mut self) {
        let now = self.clock.now_ms();
        if self.faster.check_and_consume(now) {
            self.motor.step_period_ms = self.config.faster(self.motor.step_period_ms);
            info!("Speed UP -> step_period={}ms", self.motor.step_period_ms);
            self.observer.step_period_changed(self.motor.step_period_ms);
        }

        let now = self.clock.now_ms();
        if self.slower.check_and_consume(now) {
            self.motor.step_period_ms = self.config.slower(self.motor.step_period_ms);
            info!("Speed DOWN -> step_period={}ms", self.motor.step_period_ms);
            self.observer.step_period_changed(self.motor.step_period_ms);
        }
    }

    fn enter_fault(&mut self) {
        warn!("Fault/E-stop active at step {} -> all off", self.motor.step.as_u8());
        self.state = LoopState::FaultHalted;
        self.observer.fault_entered(self.motor.step);
    }

    fn hold_until_clear(&mut self) {
        self.commutator.all_off(&mut self.motor);
        while self.safety.is_fault_active() {
            self.delay.delay_ms(self.config.fault_poll_ms);
        }

        info!("Fault cleared, resuming at step {}", self.motor.step.as_u8());
        self.commutator.all_off(&mut self.motor);
        self.delay.delay_ms(self.config.resume_settle_ms);

        self.state = LoopState::Running;
        self.observer.fault_cleared(self.motor.step);
    }
}
