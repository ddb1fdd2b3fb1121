//! Motor phase identifiers

use core::fmt;

/// One of the three motor phases
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Phase {
    A = 0,
    B = 1,
    C = 2,
}

impl Phase {
    /// All phases in index order
    pub const ALL: [Phase; 3] = [Phase::A, Phase::B, Phase::C];

    /// Get the phase index (0-2)
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::A => "A",
            Phase::B => "B",
            Phase::C => "C",
        };
        f.write_str(name)
    }
}
