//! .vfr file reader

use crate::format::{FrameFile, FrameHeader, FrameMetadata, StoredFrame, HEADER_SIZE, MAGIC, VERSION};
use crate::writer::CRC64;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub struct FrameReader;

impl FrameReader {
    /// Read .vfr file
    pub fn read(path: &Path) -> Result<FrameFile> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open .vfr file: {}", path.display()))?;

        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
            .with_context(|| format!("Failed to read .vfr file: {}", path.display()))
    }

    /// Read only the header and metadata
    pub fn read_summary(path: &Path) -> Result<(FrameHeader, FrameMetadata)> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open .vfr file: {}", path.display()))?;

        let mut reader = BufReader::new(file);
        let header = Self::read_header(&mut reader)?;
        let metadata = Self::read_metadata(&mut reader, header.metadata_size)?;
        Ok((header, metadata))
    }

    /// Decode from any reader, verifying magic, version and checksum
    pub fn read_from<R: Read>(reader: &mut R) -> Result<FrameFile> {
        let header = Self::read_header(reader)?;
        let metadata = Self::read_metadata(reader, header.metadata_size)?;

        let stored = read_len(reader, header.stored_payload_size(), "frame payload")?;

        let payload = if header.is_compressed() {
            // One extra byte lets an over-long stream show up as a size mismatch
            let decoder = zstd::stream::read::Decoder::new(&stored[..])
                .context("Failed to decompress frame payload")?;
            let mut payload = Vec::new();
            decoder
                .take(header.payload_size.saturating_add(1))
                .read_to_end(&mut payload)
                .context("Failed to decompress frame payload")?;
            payload
        } else {
            stored
        };

        if payload.len() as u64 != header.payload_size {
            anyhow::bail!(
                "Payload size mismatch: header says {}, found {}",
                header.payload_size,
                payload.len()
            );
        }

        let checksum = CRC64.checksum(&payload);
        if checksum != header.checksum {
            anyhow::bail!(
                "Checksum mismatch: expected {:016x}, computed {:016x}",
                header.checksum,
                checksum
            );
        }

        let frames = Self::decode_frames(&payload, &header)?;

        Ok(FrameFile {
            header,
            metadata,
            frames,
        })
    }

    fn read_header<R: Read>(reader: &mut R) -> Result<FrameHeader> {
        let mut buf = [0u8; HEADER_SIZE];
        reader.read_exact(&mut buf).context("Truncated .vfr header")?;
        let mut cursor = ByteCursor::new(&buf);

        let mut magic = [0u8; 4];
        magic.copy_from_slice(cursor.take(4)?);
        if magic != MAGIC {
            anyhow::bail!("Invalid .vfr file: magic bytes mismatch");
        }

        let version = cursor.u16()?;
        if version != VERSION {
            anyhow::bail!("Unsupported .vfr version {} (expected {})", version, VERSION);
        }

        Ok(FrameHeader {
            magic,
            version,
            flags: cursor.u16()?,
            native_sample_rate: cursor.u32()?,
            target_sample_rate: cursor.u32()?,
            frame_size: cursor.u32()?,
            num_frames: cursor.u32()?,
            metadata_size: cursor.u64()?,
            payload_size: cursor.u64()?,
            payload_size_compressed: cursor.u64()?,
            total_input_samples: cursor.u64()?,
            checksum: cursor.u64()?,
        })
    }

    fn read_metadata<R: Read>(reader: &mut R, size: u64) -> Result<FrameMetadata> {
        let bytes = read_len(reader, size, ".vfr metadata")?;
        let metadata = serde_json::from_slice(&bytes).context("Invalid .vfr metadata")?;
        Ok(metadata)
    }

    fn decode_frames(payload: &[u8], header: &FrameHeader) -> Result<Vec<StoredFrame>> {
        let frame_size = header.frame_size as usize;
        let mut cursor = ByteCursor::new(payload);
        let record_size = 4 + frame_size * 4;
        let capacity = (header.num_frames as usize).min(payload.len() / record_size);
        let mut frames = Vec::with_capacity(capacity);

        for _ in 0..header.num_frames {
            let original_len = cursor.u32()? as usize;
            let resampled = cursor.f32s(frame_size)?;
            let original = cursor.f32s(original_len)?;
            frames.push(StoredFrame {
                resampled,
                original,
            });
        }

        if !cursor.is_empty() {
            anyhow::bail!("Trailing bytes after {} frames", header.num_frames);
        }

        Ok(frames)
    }
}

/// Read exactly `len` bytes, growing the buffer only as data arrives
fn read_len<R: Read>(reader: &mut R, len: u64, what: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader
        .take(len)
        .read_to_end(&mut bytes)
        .with_context(|| format!("Failed to read {}", what))?;
    if (bytes.len() as u64) < len {
        anyhow::bail!("Truncated {}: expected {} bytes, found {}", what, len, bytes.len());
    }
    Ok(bytes)
}

/// Little-endian reader over an in-memory buffer
struct ByteCursor<'a> {
    bytes: &'a [u8],
}

impl<'a> ByteCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.bytes.len() < n {
            anyhow::bail!("Unexpected end of data: need {} bytes, have {}", n, self.bytes.len());
        }
        let (head, tail) = self.bytes.split_at(n);
        self.bytes = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn f32s(&mut self, count: usize) -> Result<Vec<f32>> {
        let bytes = self.take(count * 4)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::FrameWriter;
    use std::io::Cursor;

    fn sample_file() -> FrameFile {
        let mut metadata = FrameMetadata::new("speech.wav".to_string(), 2, 128);
        metadata.leftover_samples = 5;
        FrameFile {
            header: FrameHeader::new(48000, 16000, 3, 0, 23),
            metadata,
            frames: vec![
                StoredFrame {
                    resampled: vec![1.0, 2.0, 3.0],
                    original: vec![0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0, 4.5],
                },
                StoredFrame {
                    resampled: vec![-1.0, 0.0, f32::MAX],
                    original: vec![-0.25; 9],
                },
            ],
        }
    }

    fn encode(file: &FrameFile, compress: bool) -> Vec<u8> {
        let mut bytes = Vec::new();
        FrameWriter::new()
            .compressed(compress)
            .write_to(&mut bytes, file)
            .unwrap();
        bytes
    }

    #[test]
    fn test_roundtrip_uncompressed() {
        let file = sample_file();
        let bytes = encode(&file, false);

        let read = FrameReader::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(read.frames, file.frames);
        assert_eq!(read.metadata, file.metadata);
        assert_eq!(read.header.num_frames, 2);
        assert!(!read.header.is_compressed());
        assert_eq!(read.original_samples() + read.metadata.leftover_samples, 23);
    }

    #[test]
    fn test_roundtrip_compressed() {
        let file = sample_file();
        let bytes = encode(&file, true);

        let read = FrameReader::read_from(&mut Cursor::new(bytes)).unwrap();
        assert!(read.header.is_compressed());
        assert!(read.header.payload_size_compressed > 0);
        assert_eq!(read.frames, file.frames);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = encode(&sample_file(), false);
        bytes[0] = b'X';
        let err = FrameReader::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("magic"));
    }

    #[test]
    fn test_detects_corrupted_payload() {
        let mut bytes = encode(&sample_file(), false);
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let err = FrameReader::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("Checksum"));
    }

    #[test]
    fn test_truncated_file() {
        let bytes = encode(&sample_file(), false);
        let truncated = bytes[..bytes.len() - 10].to_vec();
        assert!(FrameReader::read_from(&mut Cursor::new(truncated)).is_err());
    }

    fn patched_header(compress: bool, patch: impl FnOnce(&mut FrameHeader)) -> Vec<u8> {
        let mut bytes = encode(&sample_file(), compress);
        let mut header = FrameReader::read_header(&mut Cursor::new(&bytes)).unwrap();
        patch(&mut header);

        let mut encoded = Vec::new();
        crate::writer::write_header(&mut encoded, &header).unwrap();
        bytes[..HEADER_SIZE].copy_from_slice(&encoded);
        bytes
    }

    #[test]
    fn test_huge_metadata_size_is_an_error() {
        let bytes = patched_header(false, |h| h.metadata_size = 1 << 44);
        let err = FrameReader::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("Truncated"));
    }

    #[test]
    fn test_header_only_file_with_huge_sizes() {
        let mut bytes = patched_header(false, |h| {
            h.metadata_size = 1 << 44;
            h.payload_size = u64::MAX;
        });
        bytes.truncate(HEADER_SIZE);
        assert!(FrameReader::read_from(&mut Cursor::new(bytes)).is_err());
    }

    #[test]
    fn test_huge_payload_size_is_an_error() {
        let bytes = patched_header(false, |h| h.payload_size = 1 << 44);
        let err = FrameReader::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("Truncated frame payload"));
    }

    #[test]
    fn test_huge_frame_count_is_an_error() {
        // Passes the checksum, then runs out of payload while decoding frames
        let bytes = patched_header(false, |h| h.num_frames = u32::MAX);
        let err = FrameReader::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("Unexpected end of data"));
    }

    #[test]
    fn test_decompression_stops_at_declared_size() {
        let bytes = patched_header(true, |h| h.payload_size = 8);
        let err = FrameReader::read_from(&mut Cursor::new(bytes)).unwrap_err();
        assert!(err.to_string().contains("Payload size mismatch"));
    }

    #[test]
    fn test_writer_rejects_wrong_frame_size() {
        let mut file = sample_file();
        file.frames[1].resampled.pop();
        let mut bytes = Vec::new();
        assert!(FrameWriter::new().write_to(&mut bytes, &file).is_err());
    }

    #[test]
    fn test_header_is_64_bytes() {
        let file = FrameFile {
            header: FrameHeader::new(44100, 16000, 4, 0, 0),
            metadata: FrameMetadata::new("empty.wav".to_string(), 1, 128),
            frames: Vec::new(),
        };
        let bytes = encode(&file, false);
        let metadata_len = serde_json::to_vec(&file.metadata).unwrap().len();
        assert_eq!(bytes.len(), HEADER_SIZE + metadata_len);
    }

    #[test]
    fn test_file_roundtrip_and_summary() {
        let path = std::env::temp_dir().join(format!("vadframes-{}.vfr", std::process::id()));
        let file = sample_file();
        FrameWriter::new().write(&path, &file).unwrap();

        let (header, metadata) = FrameReader::read_summary(&path).unwrap();
        let read = FrameReader::read(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(header.native_sample_rate, 48000);
        assert_eq!(metadata.source_filename, "speech.wav");
        assert_eq!(read.frames.len(), 2);
        assert_eq!(read.header.resampled_duration_ms(), 0);
    }
}
