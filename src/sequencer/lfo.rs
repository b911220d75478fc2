//! Triangle-wave vibrato producing a signed offset added to tune.

/// A triangle-wave low-frequency oscillator.
///
/// Replaced wholesale (not mutated in place) whenever the score issues a
/// full reconfigure opcode; `set_enable` both flips whether `update()` does
/// anything and restarts the oscillator from its initial counters.
#[derive(Clone, Copy, Debug)]
pub struct Lfo {
    enabled: bool,
    delay: u16,
    speed: u8,
    depth: u8,
    value: i16,
    wait_count: i32,
    depth_count: i32,
    value_current: i16,
    current: i16,
}

impl Lfo {
    /// Builds an LFO from its opcode parameters and resets it to its
    /// initial state.
    ///
    /// `delay` of 0 must already have been normalised to 256 by the caller
    /// (the opcode interpreter does this before construction).
    pub fn new(enabled: bool, delay: u16, speed: u8, depth: u8, value: i16) -> Self {
        let mut lfo = Self {
            enabled,
            delay,
            speed,
            depth,
            value,
            wait_count: 0,
            depth_count: 0,
            value_current: 0,
            current: 0,
        };
        lfo.reset();
        lfo
    }

    /// Enables or disables the oscillator and resets its counters.
    ///
    /// A disabled LFO's `update()` always returns `false`. Every call —
    /// even one that doesn't change `enabled` — restarts the triangle wave
    /// from scratch via `reset()`, matching the reference's unconditional
    /// `self._is_enable = is_enable; self.reset()`.
    pub fn set_enable(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.reset();
    }

    /// The signed offset this LFO currently contributes to tune.
    pub fn current(&self) -> i16 {
        self.current
    }

    /// Re-initialises the oscillator's internal counters from its
    /// parameters: `wait_count = delay`, `depth_count = depth >> 1`,
    /// `value_current = value`, `current = 0`. Idempotent — calling it
    /// twice in a row yields the same state as calling it once.
    pub fn reset(&mut self) {
        self.wait_count = self.delay as i32;
        self.depth_count = (self.depth >> 1) as i32;
        self.value_current = self.value;
        self.current = 0;
    }

    /// Advances the oscillator by one sequencer tick.
    ///
    /// Returns `true` exactly on ticks where `current` changed, so the
    /// caller knows to re-apply tune. When disabled, always returns
    /// `false`.
    pub fn update(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.wait_count -= 1;
        if self.wait_count != 0 {
            return false;
        }
        self.wait_count = self.speed as i32;
        self.current += self.value_current;
        self.depth_count -= 1;
        if self.depth_count == 0 {
            self.depth_count = self.depth as i32;
            self.value_current = -self.value_current;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_lfo_never_updates() {
        let mut lfo = Lfo::new(false, 1, 1, 2, 10);
        for _ in 0..16 {
            assert!(!lfo.update());
        }
        assert_eq!(lfo.current(), 0);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut lfo = Lfo::new(true, 4, 2, 6, 5);
        lfo.update();
        lfo.update();
        let mut once = lfo;
        once.reset();
        let mut twice = once;
        twice.reset();
        assert_eq!(once.current(), twice.current());
    }

    #[test]
    fn triangle_wave_oscillates_between_positive_and_negative() {
        let mut lfo = Lfo::new(true, 1, 1, 2, 3);
        let mut values = Vec::new();
        for _ in 0..8 {
            lfo.update();
            values.push(lfo.current());
        }
        assert!(values.iter().any(|&v| v > 0));
        assert!(values.iter().any(|&v| v < 0));
    }

    #[test]
    fn set_enable_always_resets_even_to_the_same_state() {
        let mut lfo = Lfo::new(true, 1, 1, 2, 10);
        for _ in 0..5 {
            lfo.update();
        }
        assert_ne!(lfo.current(), 0, "should have accumulated a nonzero offset by now");

        lfo.set_enable(false);
        assert_eq!(lfo.current(), 0, "disabling resets current");
        assert_eq!(lfo.wait_count, 1);

        lfo.set_enable(true);
        assert_eq!(lfo.current(), 0, "re-enabling restarts the wave from scratch");
        assert_eq!(lfo.wait_count, 1);
        assert_eq!(lfo.depth_count, 1);
        assert_eq!(lfo.value_current, 10);
    }

    #[test]
    fn zero_delay_must_already_be_normalised_to_256_by_the_caller() {
        let lfo = Lfo::new(true, 256, 1, 1, 1);
        assert_eq!(lfo.wait_count, 256);
    }
}
