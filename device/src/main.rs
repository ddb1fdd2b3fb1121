#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_stm32::gpio::{Flex, Input, Level, Output, Pull, Speed};
use embassy_time::Delay;
use rtt_target::{ChannelMode::*, rtt_init};
use sixstep_drive::{Board, ControlLoop, DriveConfig, SafetyMonitor};

mod motor;
use motor::bridge::HalfBridges;
use motor::{EmbassyClock, FaultLed};

// Use panic-probe for panics
use panic_probe as _;

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let channels = rtt_init! {
        up: {
            0: { size: 1024, mode: NoBlockSkip, name: "defmt" }
        }
    };
    rtt_target::set_defmt_channel(channels.up.0);

    // Initialize STM32 with HSE=8MHz feeding PLL to 170MHz SYSCLK
    let p = {
        let mut config = embassy_stm32::Config::default();
        {
            use embassy_stm32::rcc::*;
            use embassy_stm32::time::Hertz;
            config.rcc.hse = Some(Hse {
                freq: Hertz(8_000_000),
                mode: HseMode::Oscillator,
            });
            // VCO in: 8MHz / 2 = 4MHz; VCO: 4MHz * 85 = 340MHz; SYSCLK: 340MHz / 2 = 170MHz
            config.rcc.pll = Some(Pll {
                source: PllSource::HSE,
                prediv: PllPreDiv::DIV2,
                mul: PllMul::MUL85,
                divp: None,
                divq: None,
                divr: Some(PllRDiv::DIV2),
            });
            config.rcc.sys = Sysclk::PLL1_R;
            // Above 150MHz, enable Range1 boost mode per RM0440 guidance
            config.rcc.boost = true;
        }
        embassy_stm32::init(config)
    };

    let drive_config = DriveConfig::default();
    defmt::info!(
        "BLDC 6-step drive starting: step_period={}ms",
        drive_config.step_period_initial_ms
    );

    let bridges = HalfBridges::new(
        p.TIM1,
        p.PA8,  // Phase A low
        p.PA9,  // Phase B low
        p.PA10, // Phase C low
        [
            Flex::new(p.PB3), // Phase A high
            Flex::new(p.PB4), // Phase B high
            Flex::new(p.PB5), // Phase C high
        ],
        drive_config.pwm_freq_hz,
    );

    let board = Board {
        driver: bridges,
        delay: Delay,
        clock: EmbassyClock,
        safety: SafetyMonitor::new(
            Input::new(p.PB8, Pull::Up),   // E-stop, active-low
            Input::new(p.PB9, Pull::Down), // Fault, active-high
        ),
        faster: Input::new(p.PB6, Pull::Up),
        slower: Input::new(p.PB7, Pull::Up),
    };

    let led = Output::new(p.PC6, Level::Low, Speed::Low);

    let mut control = match ControlLoop::new(drive_config, board) {
        Ok(control) => control.with_observer(FaultLed::new(led)),
        Err(e) => defmt::panic!("Invalid drive config: {}", e),
    };

    // The drive loop blocks and never yields; nothing else runs on this executor.
    control.run()
}
