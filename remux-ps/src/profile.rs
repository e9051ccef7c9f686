//! Output profiles for the program stream muxer.

/// The three program stream flavours sharing one muxer implementation.
///
/// The profile fixes the container constants; the rate-dependent values
/// (mux rate, header frequencies) are derived by the muxer from the stream
/// set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// Plain MPEG-1 System stream (.mpg).
    Mpeg1System,
    /// Video CD: 2324-byte sectors, pack header on every packet.
    Vcd,
    /// DVD Video Object: MPEG-2 PS with the PES extension bytes.
    Vob,
}

impl Profile {
    /// Total size of every emitted packet, in bytes.
    pub const fn packet_size(self) -> usize {
        match self {
            Profile::Vcd => 2324,
            _ => 2048,
        }
    }

    /// Whether this profile emits MPEG-2 PES headers.
    pub const fn is_mpeg2(self) -> bool {
        matches!(self, Profile::Vob)
    }

    /// Whether this is the Video CD profile.
    pub const fn is_vcd(self) -> bool {
        matches!(self, Profile::Vcd)
    }

    /// PES header length following the 16-bit length field: the 5-byte PTS
    /// field, preceded for MPEG-2 by the 3 extension bytes.
    pub const fn pes_header_len(self) -> usize {
        if self.is_mpeg2() {
            8
        } else {
            5
        }
    }

    /// Short format name as registered with the outer registry.
    pub const fn name(self) -> &'static str {
        match self {
            Profile::Mpeg1System => "mpeg",
            Profile::Vcd => "vcd",
            Profile::Vob => "vob",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_sizes() {
        assert_eq!(Profile::Mpeg1System.packet_size(), 2048);
        assert_eq!(Profile::Vcd.packet_size(), 2324);
        assert_eq!(Profile::Vob.packet_size(), 2048);
    }

    #[test]
    fn test_flags() {
        assert!(!Profile::Mpeg1System.is_mpeg2());
        assert!(!Profile::Vcd.is_mpeg2());
        assert!(Profile::Vob.is_mpeg2());
        assert!(Profile::Vcd.is_vcd());
    }

    #[test]
    fn test_pes_header_len() {
        assert_eq!(Profile::Mpeg1System.pes_header_len(), 5);
        assert_eq!(Profile::Vob.pes_header_len(), 8);
    }
}
