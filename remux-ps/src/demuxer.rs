//! MPEG Program Stream demuxer.
//!
//! This module provides a demuxer that scans a program stream for start
//! codes, parses pack/system/PES headers, and reconstructs elementary-stream
//! packets with their presentation timestamps.

use crate::error::{PsError, Result};
use crate::pack::{
    PACK_START_CODE, PADDING_STREAM, PRIVATE_STREAM_1, PRIVATE_STREAM_2, PROGRAM_STREAM_MAP,
    SYSTEM_HEADER_START_CODE,
};
use crate::pes::{PesTimestamp, StreamId};

use byteorder::ReadBytesExt;
use std::io::{self, Read};

use remux_core::error::Error as CoreError;
use remux_core::packet::Packet;
use remux_core::timestamp::{TimeBase, Timestamp};
use remux_core::{CodecId, StreamKind};

/// Maximum number of bytes scanned for a start code per packet read.
pub const MAX_SYNC_SIZE: usize = 100_000;

/// Maximum probe score.
pub const PROBE_SCORE_MAX: u32 = 100;

/// Probe a buffer for a program stream.
///
/// Returns `PROBE_SCORE_MAX - 1` if the first start code found is one of the
/// accepted PS start codes, 0 otherwise. The score deliberately leaves room
/// for other probers (e.g. MPEG-TS) to outrank this one.
pub fn probe(buf: &[u8]) -> u32 {
    let mut code: u32 = 0xFF;

    for &byte in buf {
        code = (code << 8) | u32::from(byte);
        if (code & 0xFFFF_FF00) == 0x100 {
            let accepted = code == PACK_START_CODE
                || code == SYSTEM_HEADER_START_CODE
                || StreamId::is_video_startcode(code)
                || StreamId::is_audio_startcode(code)
                || code == PRIVATE_STREAM_2
                || code == PROGRAM_STREAM_MAP
                || code == PRIVATE_STREAM_1
                || code == PADDING_STREAM;
            return if accepted { PROBE_SCORE_MAX - 1 } else { 0 };
        }
    }
    0
}

/// An elementary stream discovered while demuxing.
#[derive(Debug, Clone)]
pub struct PsStreamInfo {
    /// Effective stream id: the 0x1XX start code, or the private-stream-1
    /// sub-id.
    pub id: u32,
    /// Stream kind.
    pub kind: StreamKind,
    /// Codec inferred from the id range.
    pub codec: CodecId,
}

impl PsStreamInfo {
    /// Get the codec name for this stream.
    pub fn codec_name(&self) -> &'static str {
        self.codec.name()
    }
}

/// MPEG Program Stream demuxer.
///
/// Streams are discovered on the fly from the PES ids encountered; each call
/// to [`read_packet`](Self::read_packet) produces one elementary-stream
/// packet.
pub struct PsDemuxer<R: Read> {
    /// Input reader.
    reader: R,
    /// 24-bit rolling state of the start-code scanner.
    header_state: u32,
    /// Discovered streams.
    streams: Vec<PsStreamInfo>,
    /// Current byte position in the input.
    position: u64,
    /// Packets produced.
    packets_read: u64,
}

impl<R: Read> PsDemuxer<R> {
    /// Create a new program stream demuxer.
    ///
    /// No bytes are consumed until the first packet is read.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            header_state: 0xFF,
            streams: Vec::new(),
            position: 0,
            packets_read: 0,
        }
    }

    /// Read the next elementary stream packet.
    ///
    /// Returns `Ok(None)` at end of input. Pack headers, system headers,
    /// padding and unknown start codes are skipped; a scrambled PES packet
    /// is refused with an error.
    pub fn read_packet(&mut self) -> std::result::Result<Option<Packet<'static>>, CoreError> {
        self.next_packet().map_err(Into::into)
    }

    fn next_packet(&mut self) -> Result<Option<Packet<'static>>> {
        loop {
            self.header_state = 0xFF;
            let mut budget = MAX_SYNC_SIZE;
            let mut startcode = match self.find_start_code(&mut budget)? {
                Some(code) => code,
                None => return Ok(None),
            };

            if startcode == PACK_START_CODE || startcode == SYSTEM_HEADER_START_CODE {
                continue;
            }
            if startcode == PADDING_STREAM || startcode == PRIVATE_STREAM_2 {
                let len = self.read_be16()?;
                self.skip_bytes(u64::from(len))?;
                continue;
            }
            if !(StreamId::is_audio_startcode(startcode)
                || StreamId::is_video_startcode(startcode)
                || startcode == PRIVATE_STREAM_1)
            {
                continue;
            }

            let mut len = i64::from(self.read_be16()?);
            let mut pts: i64 = 0;
            let mut dts: i64 = 0;

            // stuffing bytes
            let mut c;
            loop {
                c = self.read_byte()?;
                len -= 1;
                if c != 0xFF {
                    break;
                }
            }
            if (c & 0xC0) == 0x40 {
                // buffer scale & size
                self.read_byte()?;
                c = self.read_byte()?;
                len -= 2;
            }
            if (c & 0xF0) == 0x20 {
                pts = self.read_pts(Some(c))?;
                len -= 4;
                dts = pts;
            } else if (c & 0xF0) == 0x30 {
                pts = self.read_pts(Some(c))?;
                dts = self.read_pts(None)?;
                len -= 9;
            } else if (c & 0xC0) == 0x80 {
                // mpeg2 PES
                if (c & 0x30) != 0 {
                    tracing::warn!("encrypted multiplex not handled");
                    return Err(PsError::Encrypted);
                }
                let flags = self.read_byte()?;
                let mut header_len = i64::from(self.read_byte()?);
                len -= 2;
                if header_len > len {
                    continue;
                }
                if (flags & 0xC0) == 0x80 {
                    pts = self.read_pts(None)?;
                    dts = pts;
                    header_len -= 5;
                    len -= 5;
                }
                if (flags & 0xC0) == 0xC0 {
                    pts = self.read_pts(None)?;
                    dts = self.read_pts(None)?;
                    header_len -= 10;
                    len -= 10;
                }
                len -= header_len;
                while header_len > 0 {
                    self.read_byte()?;
                    header_len -= 1;
                }
            }

            if startcode == PRIVATE_STREAM_1 {
                let sub_id = self.read_byte()?;
                len -= 1;
                startcode = u32::from(sub_id);
                if StreamId::is_private1_sub(sub_id) {
                    // fixed sub-header ahead of the elementary payload
                    self.skip_bytes(3)?;
                    len -= 3;
                }
            }

            if len < 0 {
                continue;
            }

            let index = match self.streams.iter().position(|s| s.id == startcode) {
                Some(index) => index,
                None => {
                    let (kind, codec) = if StreamId::is_video_startcode(startcode) {
                        (StreamKind::Video, CodecId::Mpeg1Video)
                    } else if StreamId::is_audio_startcode(startcode) {
                        (StreamKind::Audio, CodecId::Mp2)
                    } else if startcode <= 0xFF && StreamId::is_ac3(startcode as u8) {
                        (StreamKind::Audio, CodecId::Ac3)
                    } else {
                        // not a stream we can represent
                        self.skip_bytes(len as u64)?;
                        continue;
                    };
                    tracing::debug!(stream_id = startcode, codec = %codec, "new elementary stream");
                    self.streams.push(PsStreamInfo {
                        id: startcode,
                        kind,
                        codec,
                    });
                    self.streams.len() - 1
                }
            };

            let pos = self.position;
            let mut data = vec![0u8; len as usize];
            self.read_into(&mut data)?;
            self.packets_read += 1;

            let mut packet = Packet::new(data);
            packet.stream_index = index as u32;
            packet.pts = Timestamp::new(pts, TimeBase::MPEG);
            packet.dts = Timestamp::new(dts, TimeBase::MPEG);
            packet.pos = Some(pos);
            return Ok(Some(packet));
        }
    }

    /// Consume bytes until a 24-bit start-code prefix is seen, then return
    /// the full start code as 0x1XX.
    ///
    /// Returns `Ok(None)` on end of input. Running out of budget is an I/O
    /// failure like any other.
    fn find_start_code(&mut self, budget: &mut usize) -> Result<Option<u32>> {
        let mut state = self.header_state;
        while *budget > 0 {
            let v = match self.read_byte() {
                Ok(v) => v,
                Err(PsError::Io(ref e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    self.header_state = state;
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };
            *budget -= 1;
            let next = ((state << 8) | u32::from(v)) & 0xFF_FFFF;
            if state == 0x00_0001 {
                self.header_state = next;
                return Ok(Some(next));
            }
            state = next;
        }
        self.header_state = state;
        Err(PsError::Io(io::ErrorKind::UnexpectedEof.into()))
    }

    /// Read a 5-byte PTS/DTS field, the first byte of which may already have
    /// been consumed.
    fn read_pts(&mut self, first: Option<u8>) -> Result<i64> {
        let c = match first {
            Some(c) => c,
            None => self.read_byte()?,
        };
        let mut rest = [0u8; 4];
        self.read_into(&mut rest)?;
        let ts = PesTimestamp::from_bytes([c, rest[0], rest[1], rest[2], rest[3]]);
        Ok(ts.value as i64)
    }

    fn read_byte(&mut self) -> Result<u8> {
        let v = self.reader.read_u8()?;
        self.position += 1;
        Ok(v)
    }

    fn read_be16(&mut self) -> Result<u16> {
        let v = self.reader.read_u16::<byteorder::BigEndian>()?;
        self.position += 2;
        Ok(v)
    }

    fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        self.reader.read_exact(buf)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    fn skip_bytes(&mut self, count: u64) -> Result<()> {
        let copied = io::copy(&mut (&mut self.reader).take(count), &mut io::sink())?;
        self.position += copied;
        Ok(())
    }

    /// Number of streams discovered so far.
    pub fn num_streams(&self) -> usize {
        self.streams.len()
    }

    /// Get stream info by index.
    pub fn stream(&self, index: usize) -> Option<&PsStreamInfo> {
        self.streams.get(index)
    }

    /// All streams discovered so far.
    pub fn streams(&self) -> &[PsStreamInfo] {
        &self.streams
    }

    /// Current byte position in the input.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Number of packets produced.
    pub fn packets_read(&self) -> u64 {
        self.packets_read
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_pack_header() {
        let data = [0x00, 0x00, 0x01, 0xBA, 0x21, 0x00, 0x01, 0x00, 0x01];
        assert_eq!(probe(&data), PROBE_SCORE_MAX - 1);
    }

    #[test]
    fn test_probe_elementary_start_codes() {
        assert_eq!(probe(&[0x00, 0x00, 0x01, 0xC3]), PROBE_SCORE_MAX - 1);
        assert_eq!(probe(&[0x00, 0x00, 0x01, 0xE0]), PROBE_SCORE_MAX - 1);
        assert_eq!(probe(&[0x00, 0x00, 0x01, 0xBD]), PROBE_SCORE_MAX - 1);
        assert_eq!(probe(&[0x00, 0x00, 0x01, 0xBE]), PROBE_SCORE_MAX - 1);
    }

    #[test]
    fn test_probe_rejects_ts_sync() {
        // MPEG-TS: no PS start code anywhere near the front
        let data = [0x47, 0x40, 0x00, 0x10, 0x00, 0x12, 0x34];
        assert_eq!(probe(&data), 0);
    }

    #[test]
    fn test_probe_rejects_foreign_start_code() {
        // a sequence header start code is not a PS-level code
        let data = [0x00, 0x00, 0x01, 0xB3];
        assert_eq!(probe(&data), 0);
    }

    #[test]
    fn test_probe_empty() {
        assert_eq!(probe(&[]), 0);
    }

    #[test]
    fn test_read_packet_empty_input() {
        let mut demuxer = PsDemuxer::new(io::empty());
        assert!(demuxer.read_packet().unwrap().is_none());
    }

    #[test]
    fn test_sync_budget_exhausted_is_io_error() {
        // no start code within the scan budget reads as an I/O failure,
        // same as any truncated input
        let zeros = vec![0u8; MAX_SYNC_SIZE + 16];
        let mut demuxer = PsDemuxer::new(io::Cursor::new(zeros));
        let err = demuxer.read_packet().unwrap_err();
        assert!(matches!(err, CoreError::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    fn mpeg1_pes(id: u8, pts_byte: u8, payload: &[u8]) -> Vec<u8> {
        let mut data = vec![0x00, 0x00, 0x01, id];
        let len = 5 + payload.len() as u16;
        data.extend_from_slice(&len.to_be_bytes());
        data.extend_from_slice(&[pts_byte, 0x00, 0x01, 0x00, 0x01]);
        data.extend_from_slice(payload);
        data
    }

    #[test]
    fn test_parse_simple_audio_pes() {
        let data = mpeg1_pes(0xC0, 0x21, &[1, 2, 3, 4]);
        let mut demuxer = PsDemuxer::new(io::Cursor::new(data));
        let packet = demuxer.read_packet().unwrap().unwrap();

        assert_eq!(packet.data(), &[1, 2, 3, 4]);
        assert_eq!(packet.pts.value, 0);
        assert_eq!(packet.stream_index, 0);
        assert_eq!(demuxer.num_streams(), 1);
        let stream = demuxer.stream(0).unwrap();
        assert_eq!(stream.codec, CodecId::Mp2);
        assert_eq!(stream.codec_name(), "MP2");
    }

    #[test]
    fn test_skips_padding_stream() {
        let mut data = vec![0x00, 0x00, 0x01, 0xBE, 0x00, 0x08];
        data.extend_from_slice(&[0xFF; 8]);
        data.extend_from_slice(&mpeg1_pes(0xE0, 0x21, &[9, 9]));

        let mut demuxer = PsDemuxer::new(io::Cursor::new(data));
        let packet = demuxer.read_packet().unwrap().unwrap();
        assert_eq!(packet.data(), &[9, 9]);
        assert_eq!(demuxer.stream(0).unwrap().kind, StreamKind::Video);
    }

    #[test]
    fn test_stuffing_consumed() {
        // 3 stuffing bytes ahead of the PTS
        let payload = [7u8, 8, 9];
        let mut data = vec![0x00, 0x00, 0x01, 0xC0];
        let len = 3 + 5 + payload.len() as u16;
        data.extend_from_slice(&len.to_be_bytes());
        data.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
        data.extend_from_slice(&[0x21, 0x00, 0x01, 0x00, 0x01]);
        data.extend_from_slice(&payload);

        let mut demuxer = PsDemuxer::new(io::Cursor::new(data));
        let packet = demuxer.read_packet().unwrap().unwrap();
        assert_eq!(packet.data(), &payload);
    }

    #[test]
    fn test_buffer_scale_and_size_skipped() {
        let payload = [5u8, 6];
        let mut data = vec![0x00, 0x00, 0x01, 0xC0];
        let len = 2 + 5 + payload.len() as u16;
        data.extend_from_slice(&len.to_be_bytes());
        data.extend_from_slice(&[0x40, 0x20]); // buffer scale & size
        data.extend_from_slice(&[0x21, 0x00, 0x01, 0x00, 0x01]);
        data.extend_from_slice(&payload);

        let mut demuxer = PsDemuxer::new(io::Cursor::new(data));
        let packet = demuxer.read_packet().unwrap().unwrap();
        assert_eq!(packet.data(), &payload);
    }

    #[test]
    fn test_mpeg1_pts_dts() {
        let payload = [1u8; 4];
        let mut data = vec![0x00, 0x00, 0x01, 0xE0];
        let len = 10 + payload.len() as u16;
        data.extend_from_slice(&len.to_be_bytes());
        // PTS 90000 with '0011' prefix, then DTS 45000 with '0001' prefix
        let mut pts = Vec::new();
        PesTimestamp::new(90000).write_to(&mut pts).unwrap();
        pts[0] = (pts[0] & 0x0F) | 0x30;
        data.extend_from_slice(&pts);
        let mut dts = Vec::new();
        PesTimestamp::new(45000).write_to(&mut dts).unwrap();
        dts[0] = (dts[0] & 0x0F) | 0x10;
        data.extend_from_slice(&dts);
        data.extend_from_slice(&payload);

        let mut demuxer = PsDemuxer::new(io::Cursor::new(data));
        let packet = demuxer.read_packet().unwrap().unwrap();
        assert_eq!(packet.pts.value, 90000);
        assert_eq!(packet.dts.value, 45000);
        assert_eq!(packet.data(), &payload);
    }

    #[test]
    fn test_mpeg2_pes_with_pts() {
        let payload = [0xAAu8; 6];
        let mut data = vec![0x00, 0x00, 0x01, 0xE0];
        let len = 3 + 5 + payload.len() as u16;
        data.extend_from_slice(&len.to_be_bytes());
        data.extend_from_slice(&[0x80, 0x80, 0x05]);
        let mut pts = Vec::new();
        PesTimestamp::new(180000).write_to(&mut pts).unwrap();
        data.extend_from_slice(&pts);
        data.extend_from_slice(&payload);

        let mut demuxer = PsDemuxer::new(io::Cursor::new(data));
        let packet = demuxer.read_packet().unwrap().unwrap();
        assert_eq!(packet.pts.value, 180000);
        assert_eq!(packet.data(), &payload);
    }

    #[test]
    fn test_mpeg2_encrypted_rejected() {
        let mut data = vec![0x00, 0x00, 0x01, 0xE0, 0x00, 0x08];
        data.push(0xB0); // scrambling bits set
        data.extend_from_slice(&[0x00; 7]);

        let mut demuxer = PsDemuxer::new(io::Cursor::new(data));
        let err = demuxer.read_packet().unwrap_err();
        assert!(err.to_string().contains("Encrypted"));
    }

    #[test]
    fn test_mpeg2_header_len_overrun_resyncs() {
        // declared header length exceeds the PES length: discard and read
        // the following packet instead
        let mut data = vec![0x00, 0x00, 0x01, 0xE0, 0x00, 0x03];
        data.extend_from_slice(&[0x80, 0x00, 0x60]);
        data.extend_from_slice(&mpeg1_pes(0xC0, 0x21, &[4, 5, 6]));

        let mut demuxer = PsDemuxer::new(io::Cursor::new(data));
        let packet = demuxer.read_packet().unwrap().unwrap();
        assert_eq!(packet.data(), &[4, 5, 6]);
    }

    #[test]
    fn test_private_stream_ac3() {
        let payload = [0x0Bu8, 0x77, 0x12, 0x34]; // AC-3 syncword then data
        let mut data = vec![0x00, 0x00, 0x01, 0xBD];
        let len = 5 + 4 + payload.len() as u16;
        data.extend_from_slice(&len.to_be_bytes());
        data.extend_from_slice(&[0x21, 0x00, 0x01, 0x00, 0x01]);
        data.extend_from_slice(&[0x80, 0x01, 0x00, 0x02]); // sub-id + header
        data.extend_from_slice(&payload);

        let mut demuxer = PsDemuxer::new(io::Cursor::new(data));
        let packet = demuxer.read_packet().unwrap().unwrap();
        assert_eq!(packet.data(), &payload);
        let stream = demuxer.stream(0).unwrap();
        assert_eq!(stream.codec, CodecId::Ac3);
        assert_eq!(stream.id, 0x80);
    }

    #[test]
    fn test_private_stream_unknown_sub_id_skipped() {
        // 0xA0 (LPCM) is not representable: skip it, deliver the next packet
        let mut data = vec![0x00, 0x00, 0x01, 0xBD];
        let len: u16 = 5 + 4 + 2;
        data.extend_from_slice(&len.to_be_bytes());
        data.extend_from_slice(&[0x21, 0x00, 0x01, 0x00, 0x01]);
        data.extend_from_slice(&[0xA0, 0x01, 0x00, 0x02, 0x55, 0x66]);
        data.extend_from_slice(&mpeg1_pes(0xC0, 0x21, &[1, 2]));

        let mut demuxer = PsDemuxer::new(io::Cursor::new(data));
        let packet = demuxer.read_packet().unwrap().unwrap();
        assert_eq!(packet.data(), &[1, 2]);
        assert_eq!(demuxer.num_streams(), 1);
    }

    #[test]
    fn test_position_tracking() {
        let data = mpeg1_pes(0xC0, 0x21, &[1, 2, 3, 4]);
        let total = data.len() as u64;
        let mut demuxer = PsDemuxer::new(io::Cursor::new(data));
        let packet = demuxer.read_packet().unwrap().unwrap();
        assert_eq!(packet.pos, Some(total - 4));
        assert_eq!(demuxer.position(), total);
        assert_eq!(demuxer.packets_read(), 1);
    }
}
