//! MPEG Program Stream muxer.
//!
//! This module provides a muxer for interleaving elementary audio/video
//! streams into an MPEG-1 System, VCD or MPEG-2 VOB program stream.

use crate::error::{PsError, Result};
use crate::pack::{
    PackHeader, SystemHeader, SystemStreamEntry, ISO_11172_END_CODE, PRIVATE_STREAM_1,
};
use crate::pes::{PesTimestamp, StreamId};
use crate::profile::Profile;

use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;

use remux_core::packet::Packet;
use remux_core::rational::Rational;
use remux_core::timestamp::{Ticker, TimeBase};
use remux_core::{CodecId, StreamKind};

/// Maximum number of elementary-stream bytes buffered per stream.
pub const MAX_PAYLOAD: usize = 4096;

/// Sentinel for an unset presentation timestamp.
const NO_PTS: i64 = -1;

/// Fixed sub-header following the sub-id byte of AC-3 private-stream-1
/// packets.
const AC3_SUB_HEADER: [u8; 3] = [0x01, 0x00, 0x02];

/// Stream configuration for muxing.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Stream kind.
    pub kind: StreamKind,
    /// Codec carried by the stream.
    pub codec: CodecId,
    /// Audio sample rate in Hz.
    pub sample_rate: u32,
    /// Audio frame size in samples.
    pub frame_size: u32,
    /// Video frame rate.
    pub frame_rate: Rational,
    /// Stream bitrate in bits/second.
    pub bit_rate: u32,
}

impl StreamConfig {
    /// Create an MP2 audio stream config.
    pub fn mp2(sample_rate: u32, frame_size: u32, bit_rate: u32) -> Self {
        Self {
            kind: StreamKind::Audio,
            codec: CodecId::Mp2,
            sample_rate,
            frame_size,
            frame_rate: Rational::zero(),
            bit_rate,
        }
    }

    /// Create an AC-3 audio stream config.
    pub fn ac3(sample_rate: u32, frame_size: u32, bit_rate: u32) -> Self {
        Self {
            kind: StreamKind::Audio,
            codec: CodecId::Ac3,
            sample_rate,
            frame_size,
            frame_rate: Rational::zero(),
            bit_rate,
        }
    }

    /// Create an MPEG-1 video stream config.
    pub fn mpeg1_video(frame_rate: Rational, bit_rate: u32) -> Self {
        Self {
            kind: StreamKind::Video,
            codec: CodecId::Mpeg1Video,
            sample_rate: 0,
            frame_size: 0,
            frame_rate,
            bit_rate,
        }
    }
}

/// Per-stream state during muxing.
#[derive(Debug)]
struct StreamState {
    /// Stream configuration.
    config: StreamConfig,
    /// Assigned PES id (or private-stream-1 sub-id).
    id: u8,
    /// Pending elementary-stream bytes.
    buffer: Vec<u8>,
    /// Advertised decoder buffer bound in bytes.
    max_buffer_size: usize,
    /// PES packets emitted for this stream.
    packet_number: u64,
    /// Running presentation timestamp, 90 kHz.
    pts: i64,
    /// PTS of the first buffered byte, or `NO_PTS`.
    start_pts: i64,
    /// PTS increment generator.
    ticker: Ticker,
}

/// MPEG Program Stream muxer.
///
/// Elementary-stream bytes are buffered per stream; whenever a buffer
/// reaches the packet payload limit a complete, fixed-size PS packet is
/// emitted, prefixed with pack and system headers on the configured cadence.
pub struct PsMuxer<W: Write> {
    /// Output writer.
    writer: W,
    /// Output profile.
    profile: Profile,
    /// Streams.
    streams: Vec<StreamState>,
    /// Number of audio streams.
    audio_bound: u32,
    /// Number of video streams.
    video_bound: u32,
    /// Multiplex rate in 50-byte/s units.
    mux_rate: u32,
    /// Emit a pack header every this many packets.
    pack_header_freq: u64,
    /// Emit a system header every this many packets.
    system_header_freq: u64,
    /// Maximum buffered payload before a packet must be emitted.
    packet_data_max_size: usize,
    /// Packets emitted across all streams.
    packet_number: u64,
    /// Set once the first packet data has been accepted.
    started: bool,
}

impl<W: Write> PsMuxer<W> {
    /// Create a new program stream muxer.
    pub fn new(writer: W, profile: Profile) -> Self {
        Self {
            writer,
            profile,
            streams: Vec::new(),
            audio_bound: 0,
            video_bound: 0,
            mux_rate: 0,
            pack_header_freq: 1,
            system_header_freq: 1,
            // start code (4) + length (2) + flags (1)
            packet_data_max_size: profile.packet_size() - 7,
            packet_number: 0,
            started: false,
        }
    }

    /// Add an elementary stream, returning its index.
    ///
    /// PES ids are assigned in arrival order per codec family. Streams
    /// cannot be added once muxing has started.
    pub fn add_stream(&mut self, config: StreamConfig) -> Result<usize> {
        if self.started {
            return Err(PsError::MuxerStarted);
        }

        let state = match (config.kind, config.codec) {
            (StreamKind::Audio, CodecId::Mp2) => {
                let ticker = self.audio_ticker(&config)?;
                let seq = self
                    .streams
                    .iter()
                    .filter(|s| StreamId::is_audio(s.id))
                    .count() as u8;
                self.audio_bound += 1;
                self.stream_state(config, StreamId::AUDIO_BASE + seq, 4 * 1024, ticker)
            }
            (StreamKind::Audio, CodecId::Ac3) => {
                let ticker = self.audio_ticker(&config)?;
                let seq = self
                    .streams
                    .iter()
                    .filter(|s| StreamId::is_private1_sub(s.id))
                    .count() as u8;
                self.audio_bound += 1;
                self.stream_state(config, StreamId::AC3_BASE + seq, 4 * 1024, ticker)
            }
            (StreamKind::Video, CodecId::Mpeg1Video) => {
                if !config.frame_rate.is_positive() {
                    return Err(PsError::InvalidConfig(
                        "video streams need a positive frame rate".into(),
                    ));
                }
                let ticker = Ticker::new(config.frame_rate.num, 90000 * config.frame_rate.den);
                let seq = self
                    .streams
                    .iter()
                    .filter(|s| StreamId::is_video(s.id))
                    .count() as u8;
                self.video_bound += 1;
                self.stream_state(config, StreamId::VIDEO_BASE + seq, 46 * 1024, ticker)
            }
            (kind, codec) => return Err(PsError::UnsupportedCodec { kind, codec }),
        };

        self.streams.push(state);
        self.update_rates();
        Ok(self.streams.len() - 1)
    }

    fn audio_ticker(&self, config: &StreamConfig) -> Result<Ticker> {
        if config.sample_rate == 0 || config.frame_size == 0 {
            return Err(PsError::InvalidConfig(
                "audio streams need a sample rate and frame size".into(),
            ));
        }
        Ok(Ticker::new(
            config.sample_rate as i64,
            90000 * config.frame_size as i64,
        ))
    }

    fn stream_state(
        &self,
        config: StreamConfig,
        id: u8,
        max_buffer_size: usize,
        ticker: Ticker,
    ) -> StreamState {
        StreamState {
            config,
            id,
            buffer: Vec::with_capacity(MAX_PAYLOAD),
            max_buffer_size,
            packet_number: 0,
            pts: 0,
            start_pts: NO_PTS,
            ticker,
        }
    }

    /// Recompute the rate-derived constants from the current stream set.
    ///
    /// The aggregate bitrate is padded by 2 kbit/s for header overhead.
    fn update_rates(&mut self) {
        let bitrate: u64 = 2000
            + self
                .streams
                .iter()
                .map(|s| s.config.bit_rate as u64)
                .sum::<u64>();
        self.mux_rate = ((bitrate + 8 * 50 - 1) / (8 * 50)) as u32;

        self.pack_header_freq = if self.profile.is_vcd() || self.profile.is_mpeg2() {
            // every packet
            1
        } else {
            // every 2 seconds
            (2 * bitrate / self.profile.packet_size() as u64 / 8).max(1)
        };

        self.system_header_freq = if self.profile.is_vcd() {
            self.pack_header_freq * 40
        } else {
            // every 10 seconds
            self.pack_header_freq * 5
        };
    }

    /// Write a packet of elementary-stream data.
    ///
    /// A valid `pts` on the packet re-anchors the stream timeline before the
    /// buffered bytes are stamped.
    pub fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        let force_pts = if packet.pts.is_valid() {
            Some(packet.pts.rescale(TimeBase::MPEG).value)
        } else {
            None
        };
        self.write_stream_data(packet.stream_index as usize, packet.data(), force_pts)
    }

    /// Append elementary-stream bytes, emitting PS packets as buffers fill.
    ///
    /// The stream PTS advances by one ticker step at the end of the call, so
    /// each call corresponds to one audio frame or one video frame.
    pub fn write_stream_data(
        &mut self,
        stream_index: usize,
        data: &[u8],
        force_pts: Option<i64>,
    ) -> Result<()> {
        if stream_index >= self.streams.len() {
            return Err(PsError::StreamNotFound(stream_index as u32));
        }
        self.started = true;

        let mut buf = data;
        while !buf.is_empty() {
            {
                let stream = &mut self.streams[stream_index];
                if stream.start_pts == NO_PTS {
                    if let Some(pts) = force_pts {
                        stream.pts = pts;
                    }
                    stream.start_pts = stream.pts;
                }
                let room = self.packet_data_max_size - stream.buffer.len();
                let take = room.min(buf.len());
                stream.buffer.extend_from_slice(&buf[..take]);
                buf = &buf[take..];
            }

            while self.streams[stream_index].buffer.len() >= self.packet_data_max_size {
                if self.streams[stream_index].start_pts == NO_PTS {
                    let pts = self.streams[stream_index].pts;
                    self.streams[stream_index].start_pts = pts;
                }
                self.flush_stream(stream_index, false)?;
            }
        }

        let stream = &mut self.streams[stream_index];
        stream.pts += stream.ticker.tick();
        Ok(())
    }

    /// Emit one complete PS packet for the given stream.
    fn flush_stream(&mut self, stream_index: usize, last_packet: bool) -> Result<()> {
        let packet_size = self.profile.packet_size();
        let id = self.streams[stream_index].id;
        let timestamp = self.streams[stream_index].start_pts;

        tracing::trace!(
            stream_id = id,
            packet = self.packet_number,
            pts = timestamp,
            "flushing packet"
        );

        // pack and system header prefix on the configured cadence
        let mut prefix = Vec::new();
        if self.packet_number % self.pack_header_freq == 0 {
            prefix.extend_from_slice(
                &PackHeader {
                    scr: timestamp,
                    mux_rate: self.mux_rate,
                }
                .serialize(),
            );
            if self.packet_number % self.system_header_freq == 0 {
                let header = SystemHeader {
                    rate_bound: self.mux_rate,
                    audio_bound: self.audio_bound,
                    video_bound: self.video_bound,
                    streams: self
                        .streams
                        .iter()
                        .map(|s| SystemStreamEntry {
                            id: s.id,
                            max_buffer_size: s.max_buffer_size,
                        })
                        .collect(),
                };
                prefix.extend_from_slice(&header.serialize());
            }
        }
        self.writer.write_all(&prefix)?;

        let header_len = self.profile.pes_header_len();
        let trailer_len = if last_packet { 4 } else { 0 };
        let mut payload_size = packet_size - (prefix.len() + 6 + header_len + trailer_len);
        let startcode = if id < StreamId::AUDIO_BASE {
            payload_size -= 4;
            PRIVATE_STREAM_1
        } else {
            0x100 | u32::from(id)
        };

        let fill = self.streams[stream_index].buffer.len();
        let stuffing = payload_size.saturating_sub(fill);

        self.writer.write_u32::<BigEndian>(startcode)?;
        // the length field covers neither the private sub-header nor the
        // end code
        self.writer
            .write_u16::<BigEndian>((payload_size + header_len) as u16)?;
        for _ in 0..stuffing {
            self.writer.write_u8(0xFF)?;
        }

        if self.profile.is_mpeg2() {
            self.writer.write_u8(0x80)?; // mpeg2 id
            self.writer.write_u8(0x80)?; // flags: PTS only
            self.writer.write_u8(0x05)?; // header length
        }
        PesTimestamp::new(timestamp as u64).write_to(&mut self.writer)?;

        if startcode == PRIVATE_STREAM_1 {
            self.writer.write_u8(id)?;
            if StreamId::is_private1_sub(id) {
                self.writer.write_all(&AC3_SUB_HEADER)?;
            }
        }

        let written = payload_size - stuffing;
        self.writer
            .write_all(&self.streams[stream_index].buffer[..written])?;

        if last_packet {
            self.writer.write_u32::<BigEndian>(ISO_11172_END_CODE)?;
        }
        self.writer.flush()?;

        let stream = &mut self.streams[stream_index];
        stream.buffer.drain(..written);
        stream.start_pts = NO_PTS;
        stream.packet_number += 1;
        self.packet_number += 1;
        Ok(())
    }

    /// Serialized size of the system header for the current stream set.
    fn system_header_size(&self) -> usize {
        let private = self
            .streams
            .iter()
            .filter(|s| s.id < StreamId::AUDIO_BASE)
            .count()
            .min(1);
        let regular = self
            .streams
            .iter()
            .filter(|s| s.id >= StreamId::AUDIO_BASE)
            .count();
        12 + 3 * (regular + private)
    }

    /// Payload capacity of the next packet for this stream if it were the
    /// closing packet of the multiplex.
    fn closing_capacity(&self, stream_index: usize) -> usize {
        let mut prefix = 0;
        if self.packet_number % self.pack_header_freq == 0 {
            prefix += PackHeader::SIZE;
            if self.packet_number % self.system_header_freq == 0 {
                prefix += self.system_header_size();
            }
        }
        let mut capacity =
            self.profile.packet_size() - (prefix + 6 + self.profile.pes_header_len() + 4);
        if self.streams[stream_index].id < StreamId::AUDIO_BASE {
            capacity -= 4;
        }
        capacity
    }

    /// Flush pending data and close the multiplex.
    ///
    /// The final packet of the last stream carries the ISO 11172 end code
    /// after its payload bytes.
    pub fn write_trailer(&mut self) -> Result<()> {
        let count = self.streams.len();
        for index in 0..count {
            while !self.streams[index].buffer.is_empty() {
                if self.streams[index].start_pts == NO_PTS {
                    let pts = self.streams[index].pts;
                    self.streams[index].start_pts = pts;
                }
                let last = index == count - 1
                    && self.streams[index].buffer.len() <= self.closing_capacity(index);
                self.flush_stream(index, last)?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }

    /// The output profile.
    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// The multiplex rate in 50-byte/s units.
    pub fn mux_rate(&self) -> u32 {
        self.mux_rate
    }

    /// The PES id assigned to a stream.
    pub fn stream_id(&self, index: usize) -> Option<u8> {
        self.streams.get(index).map(|s| s.id)
    }

    /// Get the number of packets written.
    pub fn packets_written(&self) -> u64 {
        self.packet_number
    }

    /// Get the number of bytes written.
    pub fn bytes_written(&self) -> u64 {
        self.packet_number * self.profile.packet_size() as u64
    }

    /// Get the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
