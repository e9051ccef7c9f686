//! Stream and codec identifiers.

use std::fmt;

/// The kind of an elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// Audio stream.
    Audio,
    /// Video stream.
    Video,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Audio => write!(f, "Audio"),
            Self::Video => write!(f, "Video"),
        }
    }
}

/// Codec identifier for elementary streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodecId {
    /// MPEG-1 video.
    Mpeg1Video,
    /// MPEG audio layer II.
    Mp2,
    /// AC-3 (Dolby Digital).
    Ac3,
}

impl CodecId {
    /// The stream kind this codec encodes.
    pub fn kind(&self) -> StreamKind {
        match self {
            Self::Mpeg1Video => StreamKind::Video,
            Self::Mp2 | Self::Ac3 => StreamKind::Audio,
        }
    }

    /// Human-readable codec name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mpeg1Video => "MPEG-1 Video",
            Self::Mp2 => "MP2",
            Self::Ac3 => "AC-3",
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
