//! Format descriptors for the outer format registry.
//!
//! The program stream core exports four descriptor records as pure data:
//! three output flavours sharing the muxer, and one input format backed by
//! the demuxer. A process-wide registry owns the registration itself.

use crate::profile::Profile;
use bitflags::bitflags;
use remux_core::CodecId;

bitflags! {
    /// Behavioural flags of a format descriptor.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FormatFlags: u32 {
        /// The format has no global header; reading may start anywhere.
        const NO_HEADER = 0x0001;
    }
}

/// Descriptor of an output (muxing) format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    /// Short format name.
    pub name: &'static str,
    /// Descriptive format name.
    pub long_name: &'static str,
    /// MIME type.
    pub mime_type: &'static str,
    /// Comma-separated default file extensions, empty if none.
    pub extensions: &'static str,
    /// Muxer profile backing this format.
    pub profile: Profile,
    /// Preferred audio codec.
    pub audio_codec: CodecId,
    /// Preferred video codec.
    pub video_codec: CodecId,
}

/// Descriptor of an input (demuxing) format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputFormat {
    /// Short format name.
    pub name: &'static str,
    /// Descriptive format name.
    pub long_name: &'static str,
    /// Behavioural flags.
    pub flags: FormatFlags,
}

/// MPEG-1 System stream output.
pub const MPEG1_SYSTEM: OutputFormat = OutputFormat {
    name: "mpeg",
    long_name: "MPEG1 System format",
    mime_type: "video/x-mpeg",
    extensions: "mpg,mpeg",
    profile: Profile::Mpeg1System,
    audio_codec: CodecId::Mp2,
    video_codec: CodecId::Mpeg1Video,
};

/// Video CD output.
pub const MPEG1_VCD: OutputFormat = OutputFormat {
    name: "vcd",
    long_name: "MPEG1 System format (VCD)",
    mime_type: "video/x-mpeg",
    extensions: "",
    profile: Profile::Vcd,
    audio_codec: CodecId::Mp2,
    video_codec: CodecId::Mpeg1Video,
};

/// MPEG-2 VOB output.
pub const MPEG2_VOB: OutputFormat = OutputFormat {
    name: "vob",
    long_name: "MPEG2 PS format (VOB)",
    mime_type: "video/x-mpeg",
    extensions: "vob",
    profile: Profile::Vob,
    audio_codec: CodecId::Mp2,
    video_codec: CodecId::Mpeg1Video,
};

/// Program stream input, served by the demuxer.
pub const MPEG_PS_INPUT: InputFormat = InputFormat {
    name: "mpeg",
    long_name: "MPEG PS format",
    flags: FormatFlags::NO_HEADER,
};

/// All output format descriptors, in registration order.
pub fn output_formats() -> &'static [OutputFormat] {
    &[MPEG1_SYSTEM, MPEG1_VCD, MPEG2_VOB]
}

/// The input format descriptor.
pub fn input_format() -> &'static InputFormat {
    &MPEG_PS_INPUT
}

/// Look up an output format by its short name.
pub fn find_output(name: &str) -> Option<&'static OutputFormat> {
    output_formats().iter().find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_names() {
        let names: Vec<_> = output_formats().iter().map(|f| f.name).collect();
        assert_eq!(names, ["mpeg", "vcd", "vob"]);
    }

    #[test]
    fn test_profiles() {
        assert_eq!(MPEG1_SYSTEM.profile, Profile::Mpeg1System);
        assert_eq!(MPEG1_VCD.profile, Profile::Vcd);
        assert_eq!(MPEG2_VOB.profile, Profile::Vob);
    }

    #[test]
    fn test_mime_and_extensions() {
        for format in output_formats() {
            assert_eq!(format.mime_type, "video/x-mpeg");
        }
        assert_eq!(MPEG1_SYSTEM.extensions, "mpg,mpeg");
        assert_eq!(MPEG1_VCD.extensions, "");
        assert_eq!(MPEG2_VOB.extensions, "vob");
    }

    #[test]
    fn test_input_format_has_no_header() {
        assert!(input_format().flags.contains(FormatFlags::NO_HEADER));
        assert_eq!(input_format().name, "mpeg");
    }

    #[test]
    fn test_find_output() {
        assert_eq!(find_output("vob"), Some(&MPEG2_VOB));
        assert_eq!(find_output("avi"), None);
    }
}
