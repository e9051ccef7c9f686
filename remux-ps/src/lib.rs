//! # Remux PS
//!
//! MPEG-1/MPEG-2 Program Stream container support for the remux library.
//!
//! This crate provides muxing and demuxing for MPEG program streams, the
//! container behind `.mpg` files, Video CDs and DVD `.vob` files.
//!
//! ## Features
//!
//! - **Three output profiles**: MPEG-1 System, VCD (2324-byte sectors) and
//!   MPEG-2 VOB share one muxer with profile-dependent constants
//! - **Fixed-size packets**: every emitted packet is exactly the profile's
//!   packet size, padded with 0xFF stuffing inside the PES header
//! - **Pack and system headers**: bit-exact, emitted on the profile's
//!   cadence with SCR and multiplex-rate fields
//! - **90 kHz timestamps**: drift-free PTS generation from sample and frame
//!   rates via integer rational arithmetic
//! - **Stream discovery**: the demuxer infers streams from PES ids
//!   (MPEG video, MP2 audio, AC-3 on private stream 1)
//! - **Probing**: container sniffing that leaves room for MPEG-TS probers
//!
//! ## Example: Muxing
//!
//! ```
//! use remux_ps::{Profile, PsMuxer, StreamConfig};
//!
//! let mut muxer = PsMuxer::new(Vec::new(), Profile::Mpeg1System);
//! let audio = muxer.add_stream(StreamConfig::mp2(44100, 1152, 128000)).unwrap();
//!
//! // one call per audio frame; the PTS advances by itself
//! for frame in [[0u8; 768]; 4] {
//!     muxer.write_stream_data(audio, &frame, None).unwrap();
//! }
//! muxer.write_trailer().unwrap();
//!
//! let output = muxer.into_inner();
//! assert_eq!(output.len() % 2048, 0);
//! ```
//!
//! ## Example: Demuxing
//!
//! ```no_run
//! use remux_ps::PsDemuxer;
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! let file = File::open("input.mpg").unwrap();
//! let mut demuxer = PsDemuxer::new(BufReader::new(file));
//!
//! while let Ok(Some(packet)) = demuxer.read_packet() {
//!     let stream = demuxer.stream(packet.stream_index as usize).unwrap();
//!     println!("{}: {} bytes, pts {}", stream.codec_name(), packet.size(), packet.pts);
//! }
//! ```
//!
//! ## Program Stream Structure
//!
//! ```text
//! +-------------+---------------+-------------------------------+
//! | Pack header | System header | PES packet                    |
//! | 00 00 01 BA | 00 00 01 BB   | 00 00 01 id | len | hdr | ES  |
//! +-------------+---------------+-------------------------------+
//!    12 bytes      periodic        fills the rest of the packet
//! ```
//!
//! - **Pack header**: SCR (33-bit, 90 kHz) and multiplex rate, emitted every
//!   `pack_header_freq` packets (every packet for VCD/VOB)
//! - **System header**: stream ids and decoder buffer bounds
//! - **PES packet**: 0xFF stuffing, optional MPEG-2 extension, PTS with
//!   marker bits, then elementary-stream bytes
//! - The final packet of the multiplex carries the ISO 11172 end code
//!   `00 00 01 B9`

pub mod demuxer;
pub mod error;
pub mod format;
pub mod muxer;
pub mod pack;
pub mod pes;
pub mod profile;

// Re-export main types
pub use demuxer::{probe, PsDemuxer, PsStreamInfo, MAX_SYNC_SIZE, PROBE_SCORE_MAX};
pub use error::{PsError, Result};
pub use format::{
    find_output, input_format, output_formats, FormatFlags, InputFormat, OutputFormat,
};
pub use muxer::{PsMuxer, StreamConfig, MAX_PAYLOAD};
pub use pack::{
    PackHeader, SystemHeader, SystemStreamEntry, ISO_11172_END_CODE, PACK_START_CODE,
    PADDING_STREAM, PRIVATE_STREAM_1, PRIVATE_STREAM_2, PROGRAM_STREAM_MAP,
    SYSTEM_HEADER_START_CODE,
};
pub use pes::{PesTimestamp, StreamId};
pub use profile::Profile;
