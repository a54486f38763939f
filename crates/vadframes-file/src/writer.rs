//! .vfr file writer

use crate::format::{FrameFile, FrameHeader, StoredFrame};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

pub(crate) const CRC64: crc::Crc<u64> = crc::Crc::<u64>::new(&crc::CRC_64_ECMA_182);

const ZSTD_LEVEL: i32 = 3;

pub struct FrameWriter {
    compress: bool,
}

impl FrameWriter {
    pub fn new() -> Self {
        Self { compress: false }
    }

    /// zstd-compress the payload
    pub fn compressed(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Write .vfr file
    pub fn write(&self, path: &Path, frame_file: &FrameFile) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create .vfr file: {}", path.display()))?;

        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer, frame_file)?;
        writer.flush()?;

        Ok(())
    }

    /// Encode to any writer, filling in sizes, flags and checksum
    pub fn write_to<W: Write>(&self, writer: &mut W, frame_file: &FrameFile) -> Result<()> {
        let frame_size = frame_file.header.frame_size as usize;
        if let Some(bad) = frame_file
            .frames
            .iter()
            .position(|f| f.resampled.len() != frame_size)
        {
            anyhow::bail!(
                "Frame {} has {} resampled samples, expected {}",
                bad,
                frame_file.frames[bad].resampled.len(),
                frame_size
            );
        }

        let metadata = serde_json::to_vec(&frame_file.metadata)?;
        let payload = encode_frames(&frame_file.frames);

        let mut header = frame_file.header.clone();
        header.num_frames = frame_file.frames.len() as u32;
        header.metadata_size = metadata.len() as u64;
        header.payload_size = payload.len() as u64;
        header.checksum = CRC64.checksum(&payload);
        header.set_compressed(self.compress);

        let stored = if self.compress {
            let compressed = zstd::encode_all(&payload[..], ZSTD_LEVEL)
                .context("Failed to compress frame payload")?;
            header.payload_size_compressed = compressed.len() as u64;
            compressed
        } else {
            header.payload_size_compressed = 0;
            payload
        };

        write_header(writer, &header)?;
        writer.write_all(&metadata)?;
        writer.write_all(&stored)?;

        Ok(())
    }
}

impl Default for FrameWriter {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn write_header<W: Write>(writer: &mut W, header: &FrameHeader) -> Result<()> {
    writer.write_all(&header.magic)?;
    writer.write_all(&header.version.to_le_bytes())?;
    writer.write_all(&header.flags.to_le_bytes())?;
    writer.write_all(&header.native_sample_rate.to_le_bytes())?;
    writer.write_all(&header.target_sample_rate.to_le_bytes())?;
    writer.write_all(&header.frame_size.to_le_bytes())?;
    writer.write_all(&header.num_frames.to_le_bytes())?;
    writer.write_all(&header.metadata_size.to_le_bytes())?;
    writer.write_all(&header.payload_size.to_le_bytes())?;
    writer.write_all(&header.payload_size_compressed.to_le_bytes())?;
    writer.write_all(&header.total_input_samples.to_le_bytes())?;
    writer.write_all(&header.checksum.to_le_bytes())?;

    Ok(())
}

fn encode_frames(frames: &[StoredFrame]) -> Vec<u8> {
    let floats: usize = frames
        .iter()
        .map(|f| f.resampled.len() + f.original.len())
        .sum();
    let mut payload = Vec::with_capacity(frames.len() * 4 + floats * 4);

    for frame in frames {
        payload.extend_from_slice(&(frame.original.len() as u32).to_le_bytes());
        for sample in frame.resampled.iter().chain(&frame.original) {
            payload.extend_from_slice(&sample.to_le_bytes());
        }
    }

    payload
}
