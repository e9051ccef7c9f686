//! Pack and system header layout.
//!
//! The program stream frames its payload behind pack headers and periodic
//! system headers. Both are bit-field sequences with mandatory marker bits
//! and are emitted through the bit writer to guarantee byte-identical
//! output.

use crate::error::{PsError, Result};
use remux_core::{BitReader, BitWriter};

/// Pack header start code.
pub const PACK_START_CODE: u32 = 0x0001BA;
/// System header start code.
pub const SYSTEM_HEADER_START_CODE: u32 = 0x0001BB;
/// ISO 11172 end code, closing the multiplex.
pub const ISO_11172_END_CODE: u32 = 0x0001B9;
/// Program stream map start code.
pub const PROGRAM_STREAM_MAP: u32 = 0x0001BC;
/// Private stream 1 start code (AC-3 and other non-MPEG payloads).
pub const PRIVATE_STREAM_1: u32 = 0x0001BD;
/// Padding stream start code.
pub const PADDING_STREAM: u32 = 0x0001BE;
/// Private stream 2 start code.
pub const PRIVATE_STREAM_2: u32 = 0x0001BF;

/// A pack header: start code, system clock reference and mux rate.
///
/// The MPEG-1 shape is emitted for all profiles; conformant MPEG-2 demuxers
/// accept it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackHeader {
    /// System clock reference in 90 kHz units (33 bits used).
    pub scr: i64,
    /// Multiplex rate in units of 50 bytes/second (22 bits used).
    pub mux_rate: u32,
}

impl PackHeader {
    /// Serialized size in bytes.
    pub const SIZE: usize = 12;

    /// Serialize to the 12-byte wire form.
    pub fn serialize(&self) -> Vec<u8> {
        let mut bw = BitWriter::with_capacity(Self::SIZE);
        let scr = self.scr as u64;

        bw.write_bits(PACK_START_CODE, 32);
        bw.write_bits(0x2, 4);
        bw.write_bits(((scr >> 30) & 0x07) as u32, 3);
        bw.write_bits(1, 1);
        bw.write_bits(((scr >> 15) & 0x7FFF) as u32, 15);
        bw.write_bits(1, 1);
        bw.write_bits((scr & 0x7FFF) as u32, 15);
        bw.write_bits(1, 1);
        bw.write_bits(1, 1);
        bw.write_bits(self.mux_rate, 22);
        bw.write_bits(1, 1);

        bw.into_data()
    }

    /// Parse the 12-byte wire form back into its fields.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut br = BitReader::new(data);
        let mut bits = |n| {
            br.read_bits(n)
                .map_err(|_| PsError::InvalidHeader("pack header truncated".into()))
        };

        if bits(32)? != PACK_START_CODE {
            return Err(PsError::InvalidHeader("not a pack header".into()));
        }
        bits(4)?;
        let mut scr = (bits(3)? as i64) << 30;
        bits(1)?;
        scr |= (bits(15)? as i64) << 15;
        bits(1)?;
        scr |= bits(15)? as i64;
        bits(1)?;
        bits(1)?;
        let mux_rate = bits(22)?;

        Ok(Self { scr, mux_rate })
    }
}

/// A stream entry advertised in the system header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemStreamEntry {
    /// PES stream id (private-stream-1 sub-ids appear collapsed as 0xBD).
    pub id: u8,
    /// Decoder buffer bound in bytes; advertised in units of 128 for audio
    /// ids and 1024 for video ids.
    pub max_buffer_size: usize,
}

/// A system header advertising the multiplex bounds and per-stream buffer
/// sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemHeader {
    /// Maximum rate of the multiplex, in 50-byte/s units.
    pub rate_bound: u32,
    /// Number of audio streams in the multiplex.
    pub audio_bound: u32,
    /// Number of video streams in the multiplex.
    pub video_bound: u32,
    /// Stream entries, in muxer stream order.
    pub streams: Vec<SystemStreamEntry>,
}

impl SystemHeader {
    /// Serialize to wire form. All private-stream-1 contributors collapse to
    /// a single 0xBD entry; the 16-bit header length is patched in after the
    /// fields are known.
    pub fn serialize(&self) -> Vec<u8> {
        let mut bw = BitWriter::with_capacity(12 + 3 * self.streams.len());

        bw.write_bits(SYSTEM_HEADER_START_CODE, 32);
        bw.write_bits(0, 16); // length, patched below
        bw.write_bits(1, 1);
        bw.write_bits(self.rate_bound, 22);
        bw.write_bits(1, 1); // marker
        bw.write_bits(self.audio_bound, 6);
        bw.write_bits(1, 1); // variable bitrate
        bw.write_bits(1, 1); // non constrained bit stream
        bw.write_bits(0, 1); // audio locked
        bw.write_bits(0, 1); // video locked
        bw.write_bits(1, 1); // marker
        bw.write_bits(self.video_bound, 5);
        bw.write_bits(0xFF, 8); // reserved byte

        let mut private_stream_coded = false;
        for stream in &self.streams {
            let mut id = stream.id;
            if id < 0xC0 {
                // private streams (AC-3 uses these) share one 0xBD entry
                if private_stream_coded {
                    continue;
                }
                private_stream_coded = true;
                id = 0xBD;
            }
            bw.write_bits(u32::from(id), 8);
            bw.write_bits(3, 2);
            if id < 0xE0 {
                bw.write_bits(0, 1);
                bw.write_bits((stream.max_buffer_size / 128) as u32, 13);
            } else {
                bw.write_bits(1, 1);
                bw.write_bits((stream.max_buffer_size / 1024) as u32, 13);
            }
        }

        let mut data = bw.into_data();
        let len = (data.len() - 6) as u16;
        data[4] = (len >> 8) as u8;
        data[5] = (len & 0xFF) as u8;
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_header_size() {
        let header = PackHeader {
            scr: 0,
            mux_rate: 325,
        };
        assert_eq!(header.serialize().len(), PackHeader::SIZE);
    }

    #[test]
    fn test_pack_header_start_code() {
        let data = PackHeader {
            scr: 90000,
            mux_rate: 325,
        }
        .serialize();
        assert_eq!(&data[..4], &[0x00, 0x00, 0x01, 0xBA]);
        // '0010' nibble introducing the SCR
        assert_eq!(data[4] >> 4, 0x2);
    }

    #[test]
    fn test_pack_header_roundtrip() {
        let header = PackHeader {
            scr: 0x1_2345_6789, // exercises all 33 bits
            mux_rate: 0x3F_FFFF,
        };
        let parsed = PackHeader::parse(&header.serialize()).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_pack_header_marker_bits() {
        let data = PackHeader {
            scr: 0,
            mux_rate: 0,
        }
        .serialize();
        let mut br = BitReader::new(&data);
        br.skip(32).unwrap();
        assert_eq!(br.read_bits(4).unwrap(), 0x2);
        br.skip(3).unwrap();
        assert_eq!(br.read_bits(1).unwrap(), 1);
        br.skip(15).unwrap();
        assert_eq!(br.read_bits(1).unwrap(), 1);
        br.skip(15).unwrap();
        assert_eq!(br.read_bits(1).unwrap(), 1);
        assert_eq!(br.read_bits(1).unwrap(), 1);
        br.skip(22).unwrap();
        assert_eq!(br.read_bits(1).unwrap(), 1);
    }

    #[test]
    fn test_system_header_length_patch() {
        let header = SystemHeader {
            rate_bound: 325,
            audio_bound: 1,
            video_bound: 0,
            streams: vec![SystemStreamEntry {
                id: 0xC0,
                max_buffer_size: 4 * 1024,
            }],
        };
        let data = header.serialize();
        assert_eq!(&data[..4], &[0x00, 0x00, 0x01, 0xBB]);
        let len = ((data[4] as usize) << 8) | data[5] as usize;
        assert_eq!(len, data.len() - 6);
        assert_eq!(data.len(), 15);
    }

    #[test]
    fn test_system_header_buffer_scaling() {
        let header = SystemHeader {
            rate_bound: 1000,
            audio_bound: 1,
            video_bound: 1,
            streams: vec![
                SystemStreamEntry {
                    id: 0xC0,
                    max_buffer_size: 4 * 1024,
                },
                SystemStreamEntry {
                    id: 0xE0,
                    max_buffer_size: 46 * 1024,
                },
            ],
        };
        let data = header.serialize();
        let mut br = BitReader::new(&data[12..]);

        assert_eq!(br.read_bits(8).unwrap(), 0xC0);
        assert_eq!(br.read_bits(2).unwrap(), 3);
        assert_eq!(br.read_bits(1).unwrap(), 0);
        assert_eq!(br.read_bits(13).unwrap(), 4 * 1024 / 128);

        assert_eq!(br.read_bits(8).unwrap(), 0xE0);
        assert_eq!(br.read_bits(2).unwrap(), 3);
        assert_eq!(br.read_bits(1).unwrap(), 1);
        assert_eq!(br.read_bits(13).unwrap(), 46 * 1024 / 1024);
    }

    #[test]
    fn test_system_header_collapses_private_streams() {
        let header = SystemHeader {
            rate_bound: 1000,
            audio_bound: 2,
            video_bound: 0,
            streams: vec![
                SystemStreamEntry {
                    id: 0x80,
                    max_buffer_size: 4 * 1024,
                },
                SystemStreamEntry {
                    id: 0x81,
                    max_buffer_size: 4 * 1024,
                },
            ],
        };
        let data = header.serialize();
        // one collapsed 0xBD entry: 12 fixed bytes + 3
        assert_eq!(data.len(), 15);
        assert_eq!(data[12], 0xBD);
    }
}
