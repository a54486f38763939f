//! .vfr file format structures
//!
//! Layout (little-endian):
//! header (64 bytes) | metadata (JSON) | payload (optionally zstd)
//!
//! Each payload record is `original_len: u32`, `frame_size` resampled `f32`s
//! and `original_len` native `f32`s.

use serde::{Deserialize, Serialize};

/// Magic bytes for .vfr files: "VFRM"
pub const MAGIC: [u8; 4] = [0x56, 0x46, 0x52, 0x4D];

/// Current format version
pub const VERSION: u16 = 1;

/// Encoded header length
pub const HEADER_SIZE: usize = 64;

const FLAG_COMPRESSED: u16 = 0x1;

/// File header (64 bytes fixed size)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameHeader {
    pub magic: [u8; 4],
    pub version: u16,
    /// Flags (bit 0: zstd payload)
    pub flags: u16,
    pub native_sample_rate: u32,
    pub target_sample_rate: u32,
    /// Resampled samples per frame
    pub frame_size: u32,
    pub num_frames: u32,
    pub metadata_size: u64,
    /// Size of payload (uncompressed)
    pub payload_size: u64,
    /// Compressed payload size (0 if uncompressed)
    pub payload_size_compressed: u64,
    /// Native samples fed to the resampler, leftover included
    pub total_input_samples: u64,
    /// CRC-64/ECMA-182 of the uncompressed payload
    pub checksum: u64,
}

impl FrameHeader {
    pub fn new(
        native_sample_rate: u32,
        target_sample_rate: u32,
        frame_size: u32,
        num_frames: u32,
        total_input_samples: u64,
    ) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            flags: 0,
            native_sample_rate,
            target_sample_rate,
            frame_size,
            num_frames,
            metadata_size: 0,
            payload_size: 0,
            payload_size_compressed: 0,
            total_input_samples,
            checksum: 0,
        }
    }

    pub fn is_compressed(&self) -> bool {
        (self.flags & FLAG_COMPRESSED) != 0
    }

    pub fn set_compressed(&mut self, compressed: bool) {
        if compressed {
            self.flags |= FLAG_COMPRESSED;
        } else {
            self.flags &= !FLAG_COMPRESSED;
        }
    }

    /// Duration of the resampled signal in milliseconds
    pub fn resampled_duration_ms(&self) -> u64 {
        if self.target_sample_rate == 0 {
            return 0;
        }
        self.num_frames as u64 * self.frame_size as u64 * 1000 / self.target_sample_rate as u64
    }

    /// Bytes of payload actually stored on disk
    pub fn stored_payload_size(&self) -> u64 {
        if self.is_compressed() {
            self.payload_size_compressed
        } else {
            self.payload_size
        }
    }
}

/// Metadata section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMetadata {
    /// Original filename of the decoded source
    pub source_filename: String,
    /// Channel count before mix-down
    pub source_channels: u16,
    /// Chunk size the processor was fed with
    pub render_quantum: u32,
    /// Native samples left in the carry buffer at end of stream
    pub leftover_samples: u64,
    pub created_at: String,
}

impl FrameMetadata {
    pub fn new(source_filename: String, source_channels: u16, render_quantum: u32) -> Self {
        Self {
            source_filename,
            source_channels,
            render_quantum,
            leftover_samples: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A single stored frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFrame {
    pub resampled: Vec<f32>,
    pub original: Vec<f32>,
}

/// Complete .vfr file structure
#[derive(Debug, Clone, PartialEq)]
pub struct FrameFile {
    pub header: FrameHeader,
    pub metadata: FrameMetadata,
    pub frames: Vec<StoredFrame>,
}

impl FrameFile {
    /// Native samples covered by stored frames
    pub fn original_samples(&self) -> u64 {
        self.frames.iter().map(|f| f.original.len() as u64).sum()
    }
}
