//! The PSG: three tone channels, one shared noise generator, one mixing table.

mod channel;
mod mixer;
mod noise;
mod tone;

pub use channel::{Output, ToneChannel};
pub use mixer::MixingTable;
pub use noise::NoiseGenerator;
pub use tone::ToneGenerator;

use core::ops::{Index, IndexMut};

/// Master clock of the AY-3-8910/YM2149 family as commonly driven in the
/// field; not mandated by the core, but a sane default for callers that
/// don't have a more specific figure.
pub const DEFAULT_MASTER_FREQUENCY_HZ: u32 = 1_789_772;

/// A common host sample rate; likewise only a default.
pub const DEFAULT_SAMPLING_FREQUENCY_HZ: u32 = 48_000;

/// Three-channel PSG: owns the channels, the shared noise source, and the
/// mixing table, and produces one mono sample per call to [`next_sample`].
///
/// [`next_sample`]: SampleGenerator::next_sample
#[derive(Clone, Debug)]
pub struct SampleGenerator {
    channels: [ToneChannel; 3],
    noise: NoiseGenerator,
    table: MixingTable,
    sampling_hz: u32,
}

impl SampleGenerator {
    /// Builds a PSG for the given master clock and sample rate.
    pub fn new(master_hz: u32, sampling_hz: u32) -> Self {
        Self {
            channels: [
                ToneChannel::new(master_hz, sampling_hz),
                ToneChannel::new(master_hz, sampling_hz),
                ToneChannel::new(master_hz, sampling_hz),
            ],
            noise: NoiseGenerator::new(master_hz, sampling_hz),
            table: MixingTable::new(),
            sampling_hz,
        }
    }

    /// Builds a PSG using the crate's recommended default clocks.
    pub fn with_default_clocks() -> Self {
        Self::new(DEFAULT_MASTER_FREQUENCY_HZ, DEFAULT_SAMPLING_FREQUENCY_HZ)
    }

    /// The sample rate this PSG was constructed with.
    pub fn sampling_frequency_hz(&self) -> u32 {
        self.sampling_hz
    }

    /// Sets the shared noise generator's frequency (0..=31).
    pub fn set_noise_frequency(&mut self, frequency: u8) -> crate::error::Result<()> {
        self.noise.set_frequency(frequency)
    }

    /// Advances the noise generator and all three channels by one sample and
    /// returns the mixed, unclipped amplitude.
    pub fn next_sample(&mut self) -> f32 {
        let is_noise = self.noise.update();
        self.channels
            .iter_mut()
            .map(|ch| self.table.get(ch.mix_with_noise(is_noise)))
            .sum()
    }
}

impl Index<usize> for SampleGenerator {
    type Output = ToneChannel;

    fn index(&self, index: usize) -> &ToneChannel {
        &self.channels[index]
    }
}

impl IndexMut<usize> for SampleGenerator {
    fn index_mut(&mut self, index: usize) -> &mut ToneChannel {
        &mut self.channels[index]
    }
}
