//! Button debounce and auto-repeat

use embedded_hal::digital::InputPin;

/// Debounce phase of a button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Debounce {
    /// Raw level agrees with the stable level
    Stable,
    /// Raw level differs; waiting for it to hold for the debounce time
    Transitioning,
}

/// Active-low push button with debounce and auto-repeat
///
/// Pressing emits one event once the level has held for `debounce_ms`, then
/// one more every `repeat_ms` while held. Releasing emits nothing. A pin that
/// cannot be read reads as released.
pub struct ButtonInput<P> {
    pin: P,
    debounce_ms: u32,
    repeat_ms: u32,
    /// true = released (pin high)
    stable_state: bool,
    phase: Debounce,
    last_change_ms: u32,
    last_event_ms: u32,
}

impl<P: InputPin> ButtonInput<P> {
    pub fn new(pin: P, debounce_ms: u32, repeat_ms: u32, now_ms: u32) -> Self {
        Self {
            pin,
            debounce_ms,
            repeat_ms,
            stable_state: true,
            phase: Debounce::Stable,
            last_change_ms: now_ms,
            last_event_ms: 0,
        }
    }

    /// Debounced state, true while held down
    pub fn is_pressed(&self) -> bool {
        !self.stable_state
    }

    pub fn debounce(&self) -> Debounce {
        self.phase
    }

    /// Sample the pin once and report whether a press or repeat event fires now.
    pub fn check_and_consume(&mut self, now_ms: u32) -> bool {
        let raw = self.pin.is_high().unwrap_or(true);

        if raw != self.stable_state {
            if self.phase == Debounce::Stable {
                self.phase = Debounce::Transitioning;
                self.last_change_ms = now_ms;
            }
            if now_ms.wrapping_sub(self.last_change_ms) < self.debounce_ms {
                return false;
            }

            self.stable_state = raw;
            self.phase = Debounce::Stable;
            self.last_change_ms = now_ms;
            if !raw {
                self.last_event_ms = now_ms;
                return true;
            }
            return false;
        }

        // Bounced back before the debounce time ran out
        self.phase = Debounce::Stable;

        if self.is_pressed() && now_ms.wrapping_sub(self.last_event_ms) >= self.repeat_ms {
            self.last_event_ms = now_ms;
            return true;
        }
        false
    }
}
