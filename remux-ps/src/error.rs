//! MPEG Program Stream error types.
//!
//! This module provides error types specific to PS muxing and demuxing.

use remux_core::{CodecId, StreamKind};
use thiserror::Error;

/// MPEG Program Stream specific errors.
#[derive(Error, Debug)]
pub enum PsError {
    /// I/O error from the byte source or sink.
    ///
    /// Also covers a start-code scan that exhausts its byte budget, which is
    /// indistinguishable from any other read failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The multiplex is scrambled; decryption is not supported.
    #[error("Encrypted multiplex not supported")]
    Encrypted,

    /// Codec not representable in a program stream.
    #[error("Unsupported codec for {kind} stream: {codec}")]
    UnsupportedCodec {
        /// The declared stream kind.
        kind: StreamKind,
        /// The offending codec.
        codec: CodecId,
    },

    /// Malformed pack or PES header.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Invalid stream parameters.
    #[error("Invalid stream configuration: {0}")]
    InvalidConfig(String),

    /// Streams cannot be added once muxing has started.
    #[error("Cannot add streams after the first packet has been written")]
    MuxerStarted,

    /// Stream index out of range.
    #[error("Stream {0} not found")]
    StreamNotFound(u32),
}

impl From<PsError> for remux_core::Error {
    fn from(err: PsError) -> Self {
        match err {
            PsError::Io(e) => remux_core::Error::Io(e),
            other => remux_core::Error::Container(
                remux_core::error::ContainerError::InvalidStructure(other.to_string()),
            ),
        }
    }
}

/// Result type for MPEG-PS operations.
pub type Result<T> = std::result::Result<T, PsError>;
