//! Simulated hardware for host tests

use core::convert::Infallible;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin};

use crate::control::StatusObserver;
use crate::hal::{Monotonic, PhaseDriver};
use crate::phase::Phase;
use crate::safety::FaultSource;
use crate::six_step::CommutationStep;

/// Shared simulated time with microsecond resolution
#[derive(Clone, Default)]
pub struct SimTime {
    micros: Rc<Cell<u64>>,
}

impl SimTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at_ms(ms: u64) -> Self {
        let time = Self::new();
        time.micros.set(ms * 1000);
        time
    }

    /// Absolute milliseconds, never wraps
    pub fn abs_ms(&self) -> u64 {
        self.micros.get() / 1000
    }

    pub fn advance_ms(&self, ms: u32) {
        self.advance_us(ms as u64 * 1000);
    }

    pub fn advance_us(&self, us: u64) {
        self.micros.set(self.micros.get() + us);
    }
}

impl Monotonic for SimTime {
    fn now_ms(&mut self) -> u32 {
        self.abs_ms() as u32
    }
}

/// Everything the drive asked of the hardware, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    HighSide(Phase, bool),
    LowSide(Phase, bool, u16),
    DelayUs(u32),
    DelayMs(u32),
}

impl Event {
    /// Turns a switch on
    pub fn is_energizing(&self) -> bool {
        matches!(self, Event::HighSide(_, true) | Event::LowSide(_, true, _))
    }
}

#[derive(Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

#[derive(Default)]
struct Bridge {
    high: [bool; 3],
    low: [Option<u16>; 3],
    shoot_through: bool,
}

/// Records every gate command and tracks which switches conduct
#[derive(Clone)]
pub struct RecordingDriver {
    log: EventLog,
    bridge: Rc<RefCell<Bridge>>,
    max_duty: u16,
}

impl RecordingDriver {
    pub fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            bridge: Rc::default(),
            max_duty: u16::MAX,
        }
    }

    pub fn with_max_duty(mut self, max_duty: u16) -> Self {
        self.max_duty = max_duty;
        self
    }

    pub fn high_sides(&self) -> Vec<Phase> {
        let bridge = self.bridge.borrow();
        Phase::ALL.into_iter().filter(|p| bridge.high[p.index()]).collect()
    }

    pub fn low_sides(&self) -> Vec<(Phase, u16)> {
        let bridge = self.bridge.borrow();
        Phase::ALL
            .into_iter()
            .filter_map(|p| bridge.low[p.index()].map(|duty| (p, duty)))
            .collect()
    }

    pub fn is_all_off(&self) -> bool {
        self.high_sides().is_empty() && self.low_sides().is_empty()
    }

    /// Both switches of one leg were ever on at the same time
    pub fn saw_shoot_through(&self) -> bool {
        self.bridge.borrow().shoot_through
    }

    fn check_leg(&self, phase: Phase) {
        let mut bridge = self.bridge.borrow_mut();
        if bridge.high[phase.index()] && bridge.low[phase.index()].is_some() {
            bridge.shoot_through = true;
        }
    }
}

impl PhaseDriver for RecordingDriver {
    fn set_high_side(&mut self, phase: Phase, on: bool) {
        self.log.push(Event::HighSide(phase, on));
        self.bridge.borrow_mut().high[phase.index()] = on;
        self.check_leg(phase);
    }

    fn set_low_side_pwm(&mut self, phase: Phase, enabled: bool, duty: u16) {
        self.log.push(Event::LowSide(phase, enabled, duty));
        self.bridge.borrow_mut().low[phase.index()] = enabled.then_some(duty);
        self.check_leg(phase);
    }

    fn max_duty(&self) -> u16 {
        self.max_duty
    }
}

/// Blocking delay that advances [`SimTime`] instead of sleeping
pub struct SimDelay {
    time: SimTime,
    log: EventLog,
}

impl SimDelay {
    pub fn new(time: &SimTime, log: &EventLog) -> Self {
        Self {
            time: time.clone(),
            log: log.clone(),
        }
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.time.advance_us((ns as u64).div_ceil(1000));
    }

    fn delay_us(&mut self, us: u32) {
        self.log.push(Event::DelayUs(us));
        self.time.advance_us(us as u64);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.log.push(Event::DelayMs(ms));
        self.time.advance_ms(ms);
    }
}

/// Input pin whose level follows a schedule in simulated time
#[derive(Clone)]
pub struct ScriptedPin {
    time: SimTime,
    initial: bool,
    changes: Rc<RefCell<Vec<(u64, bool)>>>,
}

impl ScriptedPin {
    pub fn new(time: &SimTime, initial: bool) -> Self {
        Self {
            time: time.clone(),
            initial,
            changes: Rc::default(),
        }
    }

    /// Switch to `high` from absolute simulated millisecond `at_ms` onwards
    pub fn set_at(&self, at_ms: u64, high: bool) {
        let mut changes = self.changes.borrow_mut();
        changes.push((at_ms, high));
        changes.sort_by_key(|(at, _)| *at);
    }

    /// Switch to `high` now
    pub fn set(&self, high: bool) {
        self.set_at(self.time.abs_ms(), high);
    }

    fn level(&self) -> bool {
        let now = self.time.abs_ms();
        self.changes
            .borrow()
            .iter()
            .take_while(|(at, _)| *at <= now)
            .last()
            .map_or(self.initial, |(_, high)| *high)
    }
}

impl ErrorType for ScriptedPin {
    type Error = Infallible;
}

impl InputPin for ScriptedPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.level())
    }
}

/// Pin whose every read fails
pub struct BrokenPin;

impl ErrorType for BrokenPin {
    type Error = ErrorKind;
}

impl InputPin for BrokenPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Err(ErrorKind::Other)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Err(ErrorKind::Other)
    }
}

/// Fault source with a fixed answer
pub struct FixedFault(pub bool);

impl FaultSource for FixedFault {
    fn is_fault_active(&mut self) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    FaultEntered(CommutationStep),
    FaultCleared(CommutationStep),
    PeriodChanged(u32),
}

#[derive(Clone, Default)]
pub struct RecordingObserver(Rc<RefCell<Vec<Status>>>);

impl RecordingObserver {
    pub fn statuses(&self) -> Vec<Status> {
        self.0.borrow().clone()
    }
}

impl StatusObserver for RecordingObserver {
    fn fault_entered(&mut self, step: CommutationStep) {
        self.0.borrow_mut().push(Status::FaultEntered(step));
    }

    fn fault_cleared(&mut self, step: CommutationStep) {
        self.0.borrow_mut().push(Status::FaultCleared(step));
    }

    fn step_period_changed(&mut self, period_ms: u32) {
        self.0.borrow_mut().push(Status::PeriodChanged(period_ms));
    }
}
