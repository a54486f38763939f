//! File-to-frames pipeline
//!
//! Plays a decoded file through a [`FrameProcessor`] one render quantum at a
//! time, the way an audio callback would, and collects the frames it posts.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use vadframes_core::{
    audio::{decode_audio, AudioData},
    FramePair, FrameProcessor, Message, ProcessorOptions, VadFramesConfig,
};
use vadframes_file::{FrameFile, FrameHeader, FrameMetadata, FrameWriter, StoredFrame};

/// Result of streaming one signal through the processor
#[derive(Debug, Clone)]
pub struct StreamOutcome {
    pub frames: Vec<FramePair>,
    /// Native samples left in the carry buffer
    pub leftover: Vec<f32>,
    /// Native samples accepted by the processor
    pub fed_samples: usize,
    /// Processing ended on a stop request rather than end of input
    pub stopped: bool,
}

/// Per-file JSON summary
#[derive(Debug, Clone, Serialize)]
pub struct FileSummary {
    pub input_file: String,
    pub output_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wav_file: Option<String>,
    pub native_sample_rate: u32,
    pub target_sample_rate: u32,
    pub channels: u16,
    pub duration_ms: u32,
    pub num_frames: usize,
    pub fed_samples: usize,
    pub leftover_samples: usize,
    pub stopped_early: bool,
    pub processing_time_seconds: f64,
}

/// Feed `samples` through a processor in render quanta.
///
/// With `stop_after` set, a `SpeechStop` is sent once that many native samples
/// have been accepted.
pub fn run_frames(
    samples: &[f32],
    native_sample_rate: u32,
    config: &VadFramesConfig,
    stop_after: Option<usize>,
) -> Result<StreamOutcome> {
    let (port_tx, mut port_rx) = unbounded_channel();
    let (control_tx, control_rx) = unbounded_channel();

    let options = ProcessorOptions {
        frame_samples: config.resampler.frame_samples,
        target_sample_rate: config.resampler.target_sample_rate,
    };
    let mut processor = FrameProcessor::new(options, native_sample_rate, port_tx, control_rx)?;

    let mut frames = Vec::new();
    let mut fed_samples = 0;
    let mut stopped = false;

    for chunk in samples.chunks(config.capture.render_quantum) {
        if stop_after.is_some_and(|limit| fed_samples >= limit) {
            if control_tx.send(Message::SpeechStop).is_err() {
                log::warn!("processor control channel closed before speech stop");
            }
        }

        if !processor.process(Some(chunk)) {
            stopped = true;
            break;
        }
        fed_samples += chunk.len();
        collect_frames(&mut port_rx, &mut frames);
    }
    collect_frames(&mut port_rx, &mut frames);

    log::debug!(
        "{} frames from {} native samples{}",
        frames.len(),
        fed_samples,
        if stopped { " (stopped)" } else { "" }
    );

    Ok(StreamOutcome {
        frames,
        leftover: processor.into_buffered(),
        fed_samples,
        stopped,
    })
}

fn collect_frames(port: &mut UnboundedReceiver<Message>, frames: &mut Vec<FramePair>) {
    while let Ok(message) = port.try_recv() {
        if let Message::AudioFrame(frame) = message {
            frames.push(frame);
        }
    }
}

/// Decode, frame and store one input file
pub fn process_file(
    input_path: &Path,
    output_dir: &Path,
    config: &VadFramesConfig,
    stop_after_s: Option<f64>,
) -> Result<FileSummary> {
    let start = std::time::Instant::now();

    log::info!("Processing: {}", input_path.display());
    let audio = decode_audio(input_path)?;
    log::info!(
        "Decoded audio: {:.1}s duration, {} channel(s) @ {}Hz",
        audio.duration_ms as f64 / 1000.0,
        audio.channels,
        audio.sample_rate
    );

    let mono = audio.to_mono();
    let stop_after = stop_after_s.map(|s| (s * audio.sample_rate as f64) as usize);
    let outcome = run_frames(&mono, audio.sample_rate, config, stop_after)?;

    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("Input path has no usable file name")?;
    let output_path = output_dir.join(format!("{stem}.vfr"));

    let wav_file = if config.output.write_wav {
        let wav_path = output_dir.join(format!(
            "{stem}.{}k.wav",
            config.resampler.target_sample_rate / 1000
        ));
        write_wav(&wav_path, config.resampler.target_sample_rate, &outcome.frames)?;
        Some(wav_path.display().to_string())
    } else {
        None
    };

    let num_frames = outcome.frames.len();
    let fed_samples = outcome.fed_samples;
    let leftover_samples = outcome.leftover.len();
    let stopped_early = outcome.stopped;

    write_frame_file(&output_path, input_path, &audio, config, outcome)?;

    let elapsed = start.elapsed();
    log::info!(
        "Wrote {} frames to {} in {:.2}s",
        num_frames,
        output_path.display(),
        elapsed.as_secs_f64()
    );

    Ok(FileSummary {
        input_file: input_path.display().to_string(),
        output_file: output_path.display().to_string(),
        wav_file,
        native_sample_rate: audio.sample_rate,
        target_sample_rate: config.resampler.target_sample_rate,
        channels: audio.channels,
        duration_ms: audio.duration_ms,
        num_frames,
        fed_samples,
        leftover_samples,
        stopped_early,
        processing_time_seconds: elapsed.as_secs_f64(),
    })
}

fn write_frame_file(
    output_path: &Path,
    input_path: &Path,
    audio: &AudioData,
    config: &VadFramesConfig,
    outcome: StreamOutcome,
) -> Result<()> {
    let source_filename = input_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    let mut metadata = FrameMetadata::new(
        source_filename,
        audio.channels,
        config.capture.render_quantum as u32,
    );
    metadata.leftover_samples = outcome.leftover.len() as u64;

    let header = FrameHeader::new(
        audio.sample_rate,
        config.resampler.target_sample_rate,
        config.resampler.frame_samples as u32,
        outcome.frames.len() as u32,
        outcome.fed_samples as u64,
    );

    let frames = outcome
        .frames
        .into_iter()
        .map(|f| StoredFrame {
            resampled: f.resampled,
            original: f.original,
        })
        .collect();

    let frame_file = FrameFile {
        header,
        metadata,
        frames,
    };

    FrameWriter::new()
        .compressed(config.output.compress)
        .write(output_path, &frame_file)
}

/// Write the concatenated resampled signal as 32-bit float mono WAV
fn write_wav(path: &Path, sample_rate: u32, frames: &[FramePair]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;

    for sample in frames.iter().flat_map(|f| f.resampled.iter()) {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;

    Ok(())
}

/// Resolve output directory, creating it if needed
pub fn prepare_output_dir(output_dir: &str) -> Result<PathBuf> {
    let path = PathBuf::from(output_dir);
    std::fs::create_dir_all(&path)
        .with_context(|| format!("Failed to create output directory: {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vadframes_file::FrameReader;

    fn small_config() -> VadFramesConfig {
        let mut config = VadFramesConfig::default();
        config.resampler.frame_samples = 160;
        config
    }

    #[test]
    fn test_run_frames_conserves_samples() {
        let samples: Vec<f32> = (0..10_000).map(|i| (i as f32 * 0.01).sin()).collect();
        let outcome = run_frames(&samples, 44100, &small_config(), None).unwrap();

        assert!(!outcome.stopped);
        assert_eq!(outcome.fed_samples, samples.len());

        let mut rebuilt: Vec<f32> = outcome.frames.iter().flat_map(|f| f.original.clone()).collect();
        rebuilt.extend(outcome.leftover);
        assert_eq!(rebuilt, samples);
    }

    #[test]
    fn test_run_frames_stop_after() {
        let samples = vec![0.5f32; 48000];
        let outcome = run_frames(&samples, 48000, &small_config(), Some(1000)).unwrap();

        assert!(outcome.stopped);
        // 1000 rounded up to the next 128-sample quantum
        assert_eq!(outcome.fed_samples, 1024);
        // 480 native samples per frame
        assert_eq!(outcome.frames.len(), 2);
        assert_eq!(outcome.leftover.len(), 64);
    }

    #[test]
    fn test_frame_file_matches_stream() {
        let dir = std::env::temp_dir().join(format!("vadframes-store-{}", std::process::id()));
        let output_dir = prepare_output_dir(dir.to_str().unwrap()).unwrap();
        let output_path = output_dir.join("ramp.vfr");

        let samples: Vec<f32> = (0..3000).map(|i| i as f32 / 3000.0).collect();
        let audio = AudioData {
            samples: samples.clone(),
            sample_rate: 44100,
            channels: 1,
            duration_ms: 68,
        };
        let config = small_config();
        let outcome = run_frames(&samples, 44100, &config, None).unwrap();
        let expected = outcome.frames.clone();
        let leftover = outcome.leftover.len() as u64;

        write_frame_file(&output_path, Path::new("ramp.wav"), &audio, &config, outcome).unwrap();
        let stored = FrameReader::read(&output_path).unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(stored.frames.len(), expected.len());
        for (s, e) in stored.frames.iter().zip(&expected) {
            assert_eq!(s.resampled, e.resampled);
            assert_eq!(s.original, e.original);
        }
        assert_eq!(stored.metadata.leftover_samples, leftover);
        assert_eq!(stored.header.total_input_samples, 3000);
        assert_eq!(stored.metadata.source_filename, "ramp.wav");
    }

    #[test]
    fn test_process_file_writes_vfr_and_wav() {
        let dir = std::env::temp_dir().join(format!("vadframes-pipeline-{}", std::process::id()));
        let output_dir = prepare_output_dir(dir.to_str().unwrap()).unwrap();
        let input = dir.join("tone.wav");

        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&input, spec).unwrap();
        for i in 0..4800 {
            let v = ((i % 100) as i16 - 50) * 100;
            writer.write_sample(v).unwrap();
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let mut config = small_config();
        config.output.compress = true;
        config.output.write_wav = true;

        let summary = process_file(&input, &output_dir, &config, None).unwrap();
        assert_eq!(summary.native_sample_rate, 48000);
        assert_eq!(summary.channels, 2);
        assert_eq!(summary.num_frames, 10);
        assert_eq!(summary.leftover_samples, 0);

        let stored = FrameReader::read(Path::new(&summary.output_file)).unwrap();
        assert!(stored.header.is_compressed());
        assert_eq!(stored.frames.len(), 10);
        assert_eq!(stored.original_samples(), 4800);

        let wav = hound::WavReader::open(summary.wav_file.as_ref().unwrap()).unwrap();
        assert_eq!(wav.spec().sample_rate, 16000);
        assert_eq!(wav.len(), 1600);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
