//! A single PSG channel: tone generator, tone/noise gates, and volume.

use bitflags::bitflags;

use crate::error::{FbdError, Result};
use crate::psg::tone::ToneGenerator;

bitflags! {
    /// Which sources feed a channel's output.
    ///
    /// Decoded directly from the sequencer's mode opcode (`0xEC`): bit 0 is
    /// [`Output::TONE`], bit 1 is [`Output::NOISE`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct Output: u8 {
        /// Tone generator output gated into the mix.
        const TONE  = 0b01;
        /// Shared noise generator output gated into the mix.
        const NOISE = 0b10;
    }
}

/// Tone generator plus tone/noise enable gates and a 4-bit volume.
#[derive(Clone, Debug)]
pub struct ToneChannel {
    tone_gen: ToneGenerator,
    tone_on: bool,
    noise_on: bool,
    volume: u8,
}

impl ToneChannel {
    /// Creates a channel for the given master clock and sample rate.
    pub fn new(master_hz: u32, sampling_hz: u32) -> Self {
        Self {
            tone_gen: ToneGenerator::new(master_hz, sampling_hz),
            tone_on: false,
            noise_on: false,
            volume: 0,
        }
    }

    /// Enables or disables the tone generator's contribution to the mix.
    pub fn set_tone_on(&mut self, on: bool) {
        self.tone_on = on;
    }

    /// Enables or disables the noise generator's contribution to the mix.
    pub fn set_noise_on(&mut self, on: bool) {
        self.noise_on = on;
    }

    /// Sets the channel's tone/noise gates from a decoded [`Output`] mask.
    pub fn set_mode(&mut self, mode: Output) {
        self.tone_on = mode.contains(Output::TONE);
        self.noise_on = mode.contains(Output::NOISE);
    }

    /// Sets the channel's volume (0..=15).
    pub fn set_volume(&mut self, volume: u8) -> Result<()> {
        if volume >= 16 {
            return Err(FbdError::InvalidVolume { volume });
        }
        self.volume = volume;
        Ok(())
    }

    /// Sets the channel's volume from an envelope-scaled level, masking to
    /// four bits rather than rejecting out-of-range input.
    ///
    /// Used internally by the sequencer: `apply_volume`'s arithmetic
    /// (envelope level times a raw, unvalidated `0xE1` volume byte, shifted
    /// right by 8) stays in `0..=15` for well-formed scores but can exceed
    /// it for malformed ones. Masking here keeps the mixing-table lookup
    /// panic-free without pretending the raw opcode value itself was
    /// clamped.
    pub(crate) fn set_volume_masked(&mut self, volume: u8) {
        self.volume = volume & 0x0F;
    }

    /// Sets the channel's tone period (0..=4095).
    pub fn set_tune(&mut self, tune: u16) -> Result<()> {
        self.tone_gen.set_tune(tune)
    }

    /// Sets the channel's tone period, clamping up to the generator's
    /// `tune_min` floor without validating the upper bound.
    ///
    /// Used internally by the sequencer after `apply_tune` has already
    /// clamped the computed value into `0..=4095`.
    pub(crate) fn set_tune_clamped(&mut self, tune: u16) {
        // Safe: callers only pass values already known to be < 4096.
        let _ = self.tone_gen.set_tune(tune.min(4095));
    }

    /// Advances the tone generator one sample and returns the 4-bit volume
    /// that should feed the mixing table: the channel's volume when
    /// `(tone AND tone_on) OR (is_noise AND noise_on)`, else 0.
    ///
    /// The tone generator is always advanced, even when its output is
    /// masked away, since it is a stateful oscillator that must keep phase.
    #[inline]
    pub fn mix_with_noise(&mut self, is_noise: bool) -> u8 {
        let tone = self.tone_gen.update();
        if (tone && self.tone_on) || (is_noise && self.noise_on) {
            self.volume
        } else {
            0
        }
    }
}
