//! Audio decoding
//!
//! Decodes WAV, MP3, FLAC and OGG Vorbis at their native sample rate using
//! pure Rust decoders. Rate conversion is left to the streaming resampler.

mod decoder;

pub use decoder::{decode_audio, AudioData};

use std::path::Path;

/// Supported audio formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    Ogg,
    Unknown,
}

impl AudioFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("wav") | Some("wave") => AudioFormat::Wav,
            Some("mp3") => AudioFormat::Mp3,
            Some("flac") => AudioFormat::Flac,
            Some("ogg") | Some("oga") => AudioFormat::Ogg,
            _ => AudioFormat::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(AudioFormat::from_path(Path::new("a/b.wav")), AudioFormat::Wav);
        assert_eq!(AudioFormat::from_path(Path::new("clip.MP3")), AudioFormat::Mp3);
        assert_eq!(AudioFormat::from_path(Path::new("x.flac")), AudioFormat::Flac);
        assert_eq!(AudioFormat::from_path(Path::new("x.ogg")), AudioFormat::Ogg);
        assert_eq!(AudioFormat::from_path(Path::new("x.mp4")), AudioFormat::Unknown);
        assert_eq!(AudioFormat::from_path(Path::new("noext")), AudioFormat::Unknown);
    }
}
