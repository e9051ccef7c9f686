//! # Remux Core
//!
//! Core types and utilities for the remux container library.
//!
//! This crate provides the fundamental building blocks used by the container
//! crates:
//! - Error handling types
//! - Bitstream reading/writing utilities
//! - Rational arithmetic for frame rates and time bases
//! - Timestamp management and the integer PTS ticker
//! - Packet abstractions for encoded media data
//! - Stream and codec identifiers

pub mod error;
pub mod bitstream;
pub mod rational;
pub mod timestamp;
pub mod packet;
pub mod format;

pub use error::{Error, Result};
pub use bitstream::{BitReader, BitWriter};
pub use rational::Rational;
pub use timestamp::{Ticker, TimeBase, Timestamp};
pub use packet::{Packet, PacketFlags};
pub use format::{CodecId, StreamKind};
