//! Error types for the sequencer and PSG core.

/// Result alias used throughout this crate.
pub type Result<T> = core::result::Result<T, FbdError>;

/// Errors produced while parsing an FBD score or driving the PSG.
///
/// Header parsing failures surface from [`crate::Sequencer::new`]. Setter
/// failures surface from whatever caller supplied an out-of-range value;
/// the sequencer's own opcode interpreter never violates these contracts
/// during normal playback.
#[derive(Debug, thiserror::Error)]
pub enum FbdError {
    /// The header's title bytes were not valid UTF-8.
    #[error("invalid title encoding in FBD header")]
    InvalidTitleEncoding,

    /// The envelope table offset read from the header falls outside the data.
    #[error("envelope table offset 0x{offset:04x} is out of range (length {length})")]
    EnvelopeTableOutOfRange {
        /// Resolved absolute offset.
        offset: u32,
        /// Length of the backing `SequenceData`.
        length: u32,
    },

    /// A channel offset read from the header falls outside the data.
    #[error("channel {channel} offset 0x{offset:04x} is out of range (length {length})")]
    ChannelOffsetOutOfRange {
        /// Channel index (0..3).
        channel: u8,
        /// Resolved absolute offset.
        offset: u32,
        /// Length of the backing `SequenceData`.
        length: u32,
    },

    /// A tone period fell outside `0..=4095`.
    #[error("tune {tune} out of range (expected 0..=4095)")]
    InvalidTune {
        /// The rejected value.
        tune: u16,
    },

    /// A channel volume fell outside `0..=15`.
    #[error("volume {volume} out of range (expected 0..=15)")]
    InvalidVolume {
        /// The rejected value.
        volume: u8,
    },

    /// A noise frequency fell outside `0..=31`.
    #[error("noise frequency {frequency} out of range (expected 0..=31)")]
    InvalidNoiseFrequency {
        /// The rejected value.
        frequency: u8,
    },

    /// A negative block size was requested from the block generator.
    #[error("block size must be non-negative, got {0}")]
    NegativeBlockSize(i64),
}
