//! Emergency-stop and fault input monitoring

use embedded_hal::digital::InputPin;

/// Anything that can report whether the bridge must be shut down
pub trait FaultSource {
    /// Instantaneous fault condition, re-sampled on every call
    fn is_fault_active(&mut self) -> bool;
}

/// Samples the emergency-stop (active-low) and fault (active-high) inputs.
///
/// Both causes collapse into one boolean. A pin that cannot be read counts as
/// asserted.
pub struct SafetyMonitor<E, F> {
    estop: E,
    fault: F,
}

impl<E: InputPin, F: InputPin> SafetyMonitor<E, F> {
    pub fn new(estop: E, fault: F) -> Self {
        Self { estop, fault }
    }
}

impl<E: InputPin, F: InputPin> FaultSource for SafetyMonitor<E, F> {
    fn is_fault_active(&mut self) -> bool {
        if self.estop.is_low().unwrap_or(true) {
            return true;
        }
        self.fault.is_high().unwrap_or(true)
    }
}
