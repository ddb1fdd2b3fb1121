//! Discrete half-bridges: P-MOSFET high sides on GPIO, N-MOSFET low sides on TIM1 PWM

use embassy_stm32::gpio::{Flex, OutputType, Pull, Speed};
use embassy_stm32::peripherals::{PA8, PA9, PA10, TIM1};
use embassy_stm32::time::khz;
use embassy_stm32::timer::Channel;
use embassy_stm32::timer::complementary_pwm::ComplementaryPwm;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::PwmPin;
use embassy_stm32::Peri;
use sixstep_drive::{Phase, PhaseDriver};

/// Gate outputs for the three phases
///
/// High side: the gate pin is pulled to 5 V externally (switch off). Driving
/// it low turns the P-MOSFET on; switching the pin back to an input releases
/// it to the pull-up.
///
/// Low side: TIM1 CH1..CH3, edge-aligned PWM. A disabled channel has duty 0
/// and its output stage turned off.
pub struct HalfBridges<'d> {
    high: [Flex<'d>; 3],
    pwm: ComplementaryPwm<'d, TIM1>,
    max_duty: u16,
}

impl<'d> HalfBridges<'d> {
    pub fn new(
        tim1: impl Into<Peri<'d, TIM1>>,
        pa8: impl Into<Peri<'d, PA8>>,
        pa9: impl Into<Peri<'d, PA9>>,
        pa10: impl Into<Peri<'d, PA10>>,
        mut high: [Flex<'d>; 3],
        pwm_freq_hz: u32,
    ) -> Self {
        for pin in high.iter_mut() {
            pin.set_as_input(Pull::None);
        }

        let ch1 = PwmPin::new(pa8.into(), OutputType::PushPull); // Phase A low
        let ch2 = PwmPin::new(pa9.into(), OutputType::PushPull); // Phase B low
        let ch3 = PwmPin::new(pa10.into(), OutputType::PushPull); // Phase C low

        let mut pwm = ComplementaryPwm::new(
            tim1.into(),
            Some(ch1),
            None,
            Some(ch2),
            None,
            Some(ch3),
            None,
            None,
            None,
            khz(pwm_freq_hz / 1000),
            CountingMode::EdgeAlignedUp,
        );

        for channel in [Channel::Ch1, Channel::Ch2, Channel::Ch3] {
            pwm.set_duty(channel, 0);
            pwm.disable(channel);
        }
        let max_duty = pwm.get_max_duty();

        defmt::info!("Bridge PWM init: freq={}Hz, max_duty={}", pwm_freq_hz, max_duty);

        Self {
            high,
            pwm,
            max_duty,
        }
    }

    fn channel(phase: Phase) -> Channel {
        match phase {
            Phase::A => Channel::Ch1,
            Phase::B => Channel::Ch2,
            Phase::C => Channel::Ch3,
        }
    }
}

impl PhaseDriver for HalfBridges<'_> {
    fn set_high_side(&mut self, phase: Phase, on: bool) {
        let pin = &mut self.high[phase.index()];
        if on {
            pin.set_low();
            pin.set_as_output(Speed::Low);
        } else {
            pin.set_as_input(Pull::None);
        }
    }

    fn set_low_side_pwm(&mut self, phase: Phase, enabled: bool, duty: u16) {
        let channel = Self::channel(phase);
        if enabled {
            self.pwm.set_duty(channel, duty.min(self.max_duty));
            self.pwm.enable(channel);
        } else {
            self.pwm.set_duty(channel, 0);
            self.pwm.disable(channel);
        }
    }

    fn max_duty(&self) -> u16 {
        self.max_duty
    }
}
