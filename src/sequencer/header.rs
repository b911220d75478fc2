//! FBD header: title, envelope-table offset, and up to three channel offsets.

use crate::error::{FbdError, Result};
use crate::SequenceData;

/// The parsed, immutable header of an FBD score.
///
/// All offsets are absolute (already resolved relative to the null
/// terminator that ends the title).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    title: String,
    envelope_table_offset: u32,
    channel_offsets: [Option<u32>; 3],
}

impl Header {
    /// Parses a header from the start of `data`.
    ///
    /// Reads a null-terminated UTF-8 title at offset 0 (newline bytes are
    /// normalised to spaces), then two reserved bytes, a little-endian
    /// envelope-table offset, and three little-endian channel offsets — all
    /// relative to the null terminator. A channel offset of 0 means that
    /// channel is absent.
    pub fn parse(data: &dyn SequenceData) -> Result<Self> {
        let mut title_bytes = Vec::new();
        let mut offset = 0u32;
        loop {
            let byte = data.get_byte(offset);
            if byte == 0 {
                break;
            }
            title_bytes.push(if byte == b'\n' { b' ' } else { byte });
            offset += 1;
        }
        let data_offset = offset;
        let title = String::from_utf8(title_bytes).map_err(|_| FbdError::InvalidTitleEncoding)?;

        let length = data.length();
        let envelope_table_offset = data_offset + data.get_short(data_offset + 2) as u32;
        if envelope_table_offset >= length {
            return Err(FbdError::EnvelopeTableOutOfRange {
                offset: envelope_table_offset,
                length,
            });
        }

        let mut channel_offsets = [None; 3];
        for i in 0..3u32 {
            let raw = data.get_short(data_offset + 4 + 2 * i);
            if raw != 0 {
                let resolved = data_offset + raw as u32;
                if resolved >= length {
                    return Err(FbdError::ChannelOffsetOutOfRange {
                        channel: i as u8,
                        offset: resolved,
                        length,
                    });
                }
                channel_offsets[i as usize] = Some(resolved);
            }
        }

        Ok(Self {
            title,
            envelope_table_offset,
            channel_offsets,
        })
    }

    /// The score's title, with embedded newlines normalised to spaces.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The absolute offset of the envelope (patch) table.
    pub fn envelope_table_offset(&self) -> u32 {
        self.envelope_table_offset
    }

    /// Absolute offsets of the three channel streams; `None` for an absent
    /// channel.
    pub fn channel_offsets(&self) -> [Option<u32>; 3] {
        self.channel_offsets
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// The literal S6 minimal score from the test corpus: title "T", one
    /// patch (id 1), one channel playing note 0 for one tick.
    pub(crate) fn minimal_score() -> Vec<u8> {
        vec![
            b'T', 0x00, // title + null terminator (data_offset = 1)
            0x00, 0x00, // reserved
            0x0B, 0x00, // envelope table offset = 11 -> absolute 12
            0x13, 0x00, // channel 0 offset = 19 -> absolute 20
            0x00, 0x00, // channel 1 absent
            0x00, 0x00, // channel 2 absent
            0x01, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0xFF, // patch 1: al=255 ar=255 dr=0 sl=0 sr=0 rr=255
            0xFF, // envelope table terminator
            0xE0, 0x01, // select patch 1
            0x80, 0x01, // note 0, length byte 1
            0xFF, // end of part
        ]
    }

    #[test]
    fn parses_title_offsets_and_channel_presence() {
        let data = minimal_score();
        let header = Header::parse(&data).unwrap();
        assert_eq!(header.title(), "T");
        assert_eq!(header.envelope_table_offset(), 12);
        assert_eq!(header.channel_offsets(), [Some(20), None, None]);
    }

    #[test]
    fn newlines_in_title_are_normalised_to_spaces() {
        let mut data = vec![b'a', b'\n', b'b', 0x00];
        data.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        // envelope offset points one past the header, well inside bounds.
        data[4] = 6;
        let header = Header::parse(&data).unwrap();
        assert_eq!(header.title(), "a b");
    }

    #[test]
    fn rejects_non_utf8_title() {
        let mut data = vec![0xFF, 0xFE, 0x00];
        data.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0]);
        let err = Header::parse(&data).unwrap_err();
        assert!(matches!(err, FbdError::InvalidTitleEncoding));
    }

    #[test]
    fn rejects_out_of_range_envelope_table_offset() {
        let data = vec![b'T', 0x00, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let err = Header::parse(&data).unwrap_err();
        assert!(matches!(err, FbdError::EnvelopeTableOutOfRange { .. }));
    }

    #[test]
    fn rejects_out_of_range_channel_offset() {
        let mut data = minimal_score();
        // Point channel 0 far past the end of the data.
        data[6] = 0xFF;
        data[7] = 0x7F;
        let err = Header::parse(&data).unwrap_err();
        assert!(matches!(err, FbdError::ChannelOffsetOutOfRange { channel: 0, .. }));
    }
}
