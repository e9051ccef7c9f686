//! PES (Packetized Elementary Stream) helpers.
//!
//! Stream-id classification and the 33-bit marker-bit timestamp field shared
//! by the muxer and demuxer.

use byteorder::{BigEndian, WriteBytesExt};
use std::io::{self, Write};

/// Well-known PES stream ids and id-range helpers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StreamId {
    /// Program stream map.
    ProgramStreamMap = 0xBC,
    /// Private stream 1.
    PrivateStream1 = 0xBD,
    /// Padding stream.
    PaddingStream = 0xBE,
    /// Private stream 2.
    PrivateStream2 = 0xBF,
}

impl StreamId {
    /// First MPEG audio stream id (0xC0 - 0xDF).
    pub const AUDIO_BASE: u8 = 0xC0;
    /// First video stream id (0xE0 - 0xEF).
    pub const VIDEO_BASE: u8 = 0xE0;
    /// First AC-3 private-stream-1 sub-id (0x80 - 0x9F).
    pub const AC3_BASE: u8 = 0x80;

    /// Check if a PES id is an MPEG audio stream.
    pub fn is_audio(id: u8) -> bool {
        (0xC0..=0xDF).contains(&id)
    }

    /// Check if a PES id is a video stream.
    pub fn is_video(id: u8) -> bool {
        (0xE0..=0xEF).contains(&id)
    }

    /// Check if an id is a private-stream-1 sub-id carrying a fixed
    /// sub-header (the AC-3 family).
    pub fn is_private1_sub(id: u8) -> bool {
        (0x80..=0xBF).contains(&id)
    }

    /// Check if a private-stream-1 sub-id denotes AC-3 audio.
    pub fn is_ac3(id: u8) -> bool {
        (0x80..=0x9F).contains(&id)
    }

    /// Check if a 4-byte start code (0x1XX) is an MPEG audio stream.
    pub fn is_audio_startcode(code: u32) -> bool {
        (0x1C0..=0x1DF).contains(&code)
    }

    /// Check if a 4-byte start code (0x1XX) is a video stream.
    pub fn is_video_startcode(code: u32) -> bool {
        (0x1E0..=0x1EF).contains(&code)
    }
}

/// A 33-bit PES presentation timestamp in 90 kHz units.
///
/// On the wire it occupies 5 bytes: a `0010` nibble, the three timestamp
/// thirds, and interleaved marker bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PesTimestamp {
    /// 33-bit timestamp value (90 kHz clock).
    pub value: u64,
}

impl PesTimestamp {
    /// Maximum value for a 33-bit timestamp.
    pub const MAX_VALUE: u64 = (1u64 << 33) - 1;

    /// Clock rate (90 kHz).
    pub const CLOCK_RATE: u64 = 90_000;

    /// Create a new PES timestamp, masked to 33 bits.
    pub fn new(value: u64) -> Self {
        Self {
            value: value & Self::MAX_VALUE,
        }
    }

    /// Decode from the 5-byte wire form.
    pub fn from_bytes(b: [u8; 5]) -> Self {
        let value = (((b[0] as u64) >> 1) & 0x07) << 30
            | ((((b[1] as u64) << 8 | b[2] as u64) >> 1) << 15)
            | (((b[3] as u64) << 8 | b[4] as u64) >> 1);
        Self { value }
    }

    /// Write the 5-byte wire form: `0010`, ts[32:30], marker, ts[29:15],
    /// marker, ts[14:0], marker.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u8((0x02 << 4) | ((((self.value >> 30) & 0x07) as u8) << 1) | 1)?;
        writer.write_u16::<BigEndian>(((((self.value >> 15) & 0x7FFF) << 1) | 1) as u16)?;
        writer.write_u16::<BigEndian>((((self.value & 0x7FFF) << 1) | 1) as u16)?;
        Ok(())
    }
}
