//! 6-step commutation sequence for trapezoidal BLDC drive

use crate::phase::Phase;

/// High-side / low-side pairing for each step, indexed by [`CommutationStep`]
const COMMUTATION: [(Phase, Phase); 6] = [
    (Phase::A, Phase::B),
    (Phase::A, Phase::C),
    (Phase::B, Phase::C),
    (Phase::B, Phase::A),
    (Phase::C, Phase::A),
    (Phase::C, Phase::B),
];

/// 6-step commutation state
///
/// Each step energizes 2 of the 3 phases:
/// - One phase connected to supply (high-side on)
/// - One phase pulled to ground through PWM (low-side)
/// - One phase floating (high-Z)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum CommutationStep {
    #[default]
    Step0 = 0, // A+, B-, C floating
    Step1 = 1, // A+, C-, B floating
    Step2 = 2, // B+, C-, A floating
    Step3 = 3, // B+, A-, C floating
    Step4 = 4, // C+, A-, B floating
    Step5 = 5, // C+, B-, A floating
}

impl CommutationStep {
    /// All steps in drive order
    pub const ALL: [CommutationStep; 6] = [
        Self::Step0,
        Self::Step1,
        Self::Step2,
        Self::Step3,
        Self::Step4,
        Self::Step5,
    ];

    /// Advance to the next commutation step
    pub fn next(self) -> Self {
        match self {
            Self::Step0 => Self::Step1,
            Self::Step1 => Self::Step2,
            Self::Step2 => Self::Step3,
            Self::Step3 => Self::Step4,
            Self::Step4 => Self::Step5,
            Self::Step5 => Self::Step0,
        }
    }

    /// Get the step number (0-5)
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Phase whose high-side switch conducts during this step
    pub fn high_side(self) -> Phase {
        COMMUTATION[self as usize].0
    }

    /// Phase whose low-side switch is PWM-modulated during this step
    pub fn low_side(self) -> Phase {
        COMMUTATION[self as usize].1
    }
}
