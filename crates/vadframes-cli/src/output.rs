//! JSON output formatting

use serde::Serialize;
use vadframes_core::ResamplerConfig;
use vadframes_file::{FrameFile, FrameHeader, FrameMetadata, StoredFrame};

/// Print any serializable value as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing output: {}", e),
    }
}

#[derive(Debug, Serialize)]
pub struct InspectReport<'a> {
    pub header: &'a FrameHeader,
    pub metadata: &'a FrameMetadata,
    pub resampled_duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<Verification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames: Option<&'a [StoredFrame]>,
}

/// Outcome of checking a stored file against the resampler's invariants
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Verification {
    pub ok: bool,
    pub problems: Vec<String>,
}

/// Check frame sizes, per-frame native span and sample conservation
pub fn verify(file: &FrameFile) -> Verification {
    let header = &file.header;
    let mut problems = Vec::new();

    let config = ResamplerConfig::new(
        header.native_sample_rate,
        header.target_sample_rate,
        header.frame_size as usize,
    );
    let expected_span = match config.validate() {
        Ok(()) => Some(config.samples_per_frame()),
        Err(e) => {
            problems.push(format!("invalid rates in header: {}", e));
            None
        }
    };

    for (index, frame) in file.frames.iter().enumerate() {
        if frame.resampled.len() != header.frame_size as usize {
            problems.push(format!(
                "frame {}: {} resampled samples, expected {}",
                index,
                frame.resampled.len(),
                header.frame_size
            ));
        }
        if let Some(span) = expected_span {
            if frame.original.len() != span {
                problems.push(format!(
                    "frame {}: {} native samples, expected {}",
                    index,
                    frame.original.len(),
                    span
                ));
            }
        }
    }

    let accounted = file.original_samples() + file.metadata.leftover_samples;
    if accounted != header.total_input_samples {
        problems.push(format!(
            "{} native samples accounted for, {} were fed",
            accounted, header.total_input_samples
        ));
    }

    Verification {
        ok: problems.is_empty(),
        problems,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_with(frames: Vec<StoredFrame>, leftover: u64, total: u64) -> FrameFile {
        let mut metadata = FrameMetadata::new("x.wav".to_string(), 1, 128);
        metadata.leftover_samples = leftover;
        FrameFile {
            header: FrameHeader::new(48000, 16000, 2, frames.len() as u32, total),
            metadata,
            frames,
        }
    }

    #[test]
    fn test_verify_consistent_file() {
        let frame = StoredFrame {
            resampled: vec![0.0, 0.0],
            original: vec![0.0; 6],
        };
        let file = file_with(vec![frame.clone(), frame], 3, 15);
        assert_eq!(
            verify(&file),
            Verification {
                ok: true,
                problems: Vec::new()
            }
        );
    }

    #[test]
    fn test_verify_reports_problems() {
        let frame = StoredFrame {
            resampled: vec![0.0],
            original: vec![0.0; 5],
        };
        let report = verify(&file_with(vec![frame], 0, 6));
        assert!(!report.ok);
        assert_eq!(report.problems.len(), 3);
    }
}
