//! Drive timing and PWM configuration

use thiserror::Error;

/// Low-side PWM carrier frequency
pub const PWM_FREQ_HZ: u32 = 20_000;
/// Software deadtime between complementary switch transitions
pub const DEAD_TIME_US: u32 = 10;
/// Low-side duty at start-up, as a share of the driver's maximum duty
pub const INITIAL_DUTY_PERCENT: u8 = 80;

/// Commutation period at start-up
pub const STEP_TIME_INITIAL_MS: u32 = 200;
/// Shortest commutation period (fastest)
pub const STEP_TIME_MIN_MS: u32 = 20;
/// Longest commutation period (slowest)
pub const STEP_TIME_MAX_MS: u32 = 2000;
/// Period change per button event
pub const STEP_TIME_STEP_MS: u32 = 20;

/// A raw button level must hold this long before it is accepted
pub const DEBOUNCE_MS: u32 = 50;
/// Interval between repeat events while a button is held
pub const REPEAT_MS: u32 = 150;
/// Button and fault polling granularity during the step wait
pub const POLL_MS: u32 = 10;

/// Safety input polling interval while halted
pub const FAULT_POLL_MS: u32 = 100;
/// Pause after a fault clears, before commutation resumes
pub const RESUME_SETTLE_MS: u32 = 50;

/// Rejected configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[error("PWM frequency {0} Hz must be a non-zero multiple of 1 kHz")]
    PwmFrequencyOutOfRange(u32),
    #[error("deadtime must be non-zero")]
    ZeroDeadTime,
    #[error("step period bounds inverted: min {min} ms > max {max} ms")]
    InvertedPeriodBounds { min: u32, max: u32 },
    #[error("initial step period {0} ms outside the allowed bounds")]
    InitialPeriodOutOfRange(u32),
    #[error("step period adjustment must be non-zero")]
    ZeroPeriodStep,
    #[error("poll interval must be non-zero")]
    ZeroPollInterval,
    #[error("fault poll interval must be non-zero")]
    ZeroFaultPollInterval,
    #[error("duty percent {0} exceeds 100")]
    DutyOutOfRange(u8),
}

/// Drive configuration
///
/// All timing values are in milliseconds unless the field name says otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriveConfig {
    pub pwm_freq_hz: u32,
    pub dead_time_us: u32,
    pub initial_duty_percent: u8,
    pub step_period_initial_ms: u32,
    pub step_period_min_ms: u32,
    pub step_period_max_ms: u32,
    pub step_period_step_ms: u32,
    pub debounce_ms: u32,
    pub repeat_ms: u32,
    pub poll_ms: u32,
    pub fault_poll_ms: u32,
    pub resume_settle_ms: u32,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            pwm_freq_hz: PWM_FREQ_HZ,
            dead_time_us: DEAD_TIME_US,
            initial_duty_percent: INITIAL_DUTY_PERCENT,
            step_period_initial_ms: STEP_TIME_INITIAL_MS,
            step_period_min_ms: STEP_TIME_MIN_MS,
            step_period_max_ms: STEP_TIME_MAX_MS,
            step_period_step_ms: STEP_TIME_STEP_MS,
            debounce_ms: DEBOUNCE_MS,
            repeat_ms: REPEAT_MS,
            poll_ms: POLL_MS,
            fault_poll_ms: FAULT_POLL_MS,
            resume_settle_ms: RESUME_SETTLE_MS,
        }
    }
}

impl DriveConfig {
    /// Check that the values are mutually consistent
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pwm_freq_hz == 0 || self.pwm_freq_hz % 1000 != 0 {
            return Err(ConfigError::PwmFrequencyOutOfRange(self.pwm_freq_hz));
        }
        if self.dead_time_us == 0 {
            return Err(ConfigError::ZeroDeadTime);
        }
        if self.step_period_min_ms > self.step_period_max_ms {
            return Err(ConfigError::InvertedPeriodBounds {
                min: self.step_period_min_ms,
                max: self.step_period_max_ms,
            });
        }
        if !(self.step_period_min_ms..=self.step_period_max_ms)
            .contains(&self.step_period_initial_ms)
        {
            return Err(ConfigError::InitialPeriodOutOfRange(
                self.step_period_initial_ms,
            ));
        }
        if self.step_period_step_ms == 0 {
            return Err(ConfigError::ZeroPeriodStep);
        }
        if self.poll_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.fault_poll_ms == 0 {
            return Err(ConfigError::ZeroFaultPollInterval);
        }
        if self.initial_duty_percent > 100 {
            return Err(ConfigError::DutyOutOfRange(self.initial_duty_percent));
        }
        Ok(())
    }

    /// Initial low-side duty for a driver whose full scale is `max_duty`
    pub fn initial_duty(&self, max_duty: u16) -> u16 {
        let percent = self.initial_duty_percent.min(100) as u32;
        (max_duty as u32 * percent / 100) as u16
    }

    /// Shorten the step period by one adjustment, never below the minimum
    pub fn faster(&self, period_ms: u32) -> u32 {
        period_ms
            .saturating_sub(self.step_period_step_ms)
            .max(self.step_period_min_ms)
    }

    /// Lengthen the step period by one adjustment, never above the maximum
    pub fn slower(&self, period_ms: u32) -> u32 {
        period_ms
            .saturating_add(self.step_period_step_ms)
            .min(self.step_period_max_ms)
    }
}
