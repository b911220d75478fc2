//! Nonlinear mixing table mapping 4-bit channel volumes to amplitudes.

/// A 17-entry nonlinear attenuation table, indexed directly by a channel's
/// 4-bit volume (0..=15).
///
/// `table[0] == 0.0` (silence — also what a gated-off channel reads); for
/// `v` in `1..=15`, `table[v] = (1/3) * mul^(16-v)` where `mul = 1 / sqrt(2)`,
/// increasing monotonically with volume. This is a sum-of-attenuations
/// model, not a voltage-divider model — the two give audibly different
/// loudness and channel balance, and only the former matches historical
/// playback. Entry 16 is never read by the pipeline (volumes only span
/// `0..=15`); it mirrors entry 15 for safety rather than being left at an
/// arbitrary default.
#[derive(Clone, Debug)]
pub struct MixingTable {
    levels: [f32; 17],
}

impl MixingTable {
    /// Builds the table.
    pub fn new() -> Self {
        let mul = 1.0_f32 / 2.0_f32.sqrt();
        let mut levels = [0.0_f32; 17];
        for v in 1..=15usize {
            levels[v] = (1.0 / 3.0) * mul.powi((16 - v) as i32);
        }
        levels[0] = 0.0;
        // Index 16 is never used by the pipeline; mirror its neighbour.
        levels[16] = levels[15];
        Self { levels }
    }

    /// Looks up the amplitude for a 4-bit channel volume (0..=15).
    ///
    /// Indices outside `0..=16` are a caller bug; callers in this crate are
    /// expected to mask volumes to four bits before indexing (see
    /// [`crate::psg::ToneChannel::mix_with_noise`]).
    #[inline]
    pub fn get(&self, index: u8) -> f32 {
        self.levels[index as usize]
    }
}

impl Default for MixingTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn index_zero_is_silence() {
        let table = MixingTable::new();
        assert_relative_eq!(table.get(0), 0.0);
    }

    #[test]
    fn levels_increase_monotonically_with_volume() {
        let table = MixingTable::new();
        for i in 0..15u8 {
            assert!(
                table.get(i) < table.get(i + 1),
                "level at {} should be quieter than at {}",
                i,
                i + 1
            );
        }
    }

    #[test]
    fn index_16_mirrors_its_neighbour() {
        let table = MixingTable::new();
        assert_relative_eq!(table.get(16), table.get(15));
    }

    #[test]
    fn index_fifteen_matches_the_closed_form() {
        let table = MixingTable::new();
        let mul = 1.0_f32 / 2.0_f32.sqrt();
        let expected = (1.0 / 3.0) * mul.powi(1);
        assert_relative_eq!(table.get(15), expected, epsilon = 1e-6);
    }
}
