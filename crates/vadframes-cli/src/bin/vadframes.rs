//! vadframes - turn audio files into 16 kHz VAD frames
//!
//! Usage: vadframes [OPTIONS] <INPUTS>...

use anyhow::Result;
use clap::Parser;
use rayon::prelude::*;
use std::path::Path;
use vadframes_cli::output::print_json;
use vadframes_cli::pipeline::{prepare_output_dir, process_file};
use vadframes_core::VadFramesConfig;

#[derive(Parser, Debug)]
#[command(name = "vadframes")]
#[command(about = "Resample audio files into fixed-size VAD frames", long_about = None)]
struct Args {
    /// Input audio files (wav, mp3, flac, ogg)
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output directory for .vfr files
    #[arg(short, long, default_value = "frames")]
    output_dir: String,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Target sample rate in Hz
    #[arg(long)]
    target_rate: Option<u32>,

    /// Resampled samples per frame
    #[arg(long)]
    frame_samples: Option<usize>,

    /// Native samples per processor callback
    #[arg(long)]
    chunk_size: Option<usize>,

    /// zstd-compress frame payloads
    #[arg(long)]
    compress: bool,

    /// Also write the resampled signal as WAV
    #[arg(long)]
    wav: bool,

    /// Send a speech-stop after this many seconds of input
    #[arg(long)]
    stop_after: Option<f64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Default: no logs (clean JSON output for parsing)
    // Verbose: show Info level logs for debugging
    let level = if args.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Off
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let config = load_config(&args)?;
    run_vadframes(&args.inputs, &args.output_dir, &config, args.stop_after)
}

fn load_config(args: &Args) -> Result<VadFramesConfig> {
    let mut config = match &args.config {
        Some(path) => VadFramesConfig::load(Path::new(path))?,
        None => VadFramesConfig::default(),
    };

    if let Some(rate) = args.target_rate {
        config.resampler.target_sample_rate = rate;
    }
    if let Some(frame_samples) = args.frame_samples {
        config.resampler.frame_samples = frame_samples;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.capture.render_quantum = chunk_size;
    }
    config.output.compress |= args.compress;
    config.output.write_wav |= args.wav;

    config.validate()?;
    Ok(config)
}

fn run_vadframes(
    inputs: &[String],
    output_dir: &str,
    config: &VadFramesConfig,
    stop_after: Option<f64>,
) -> Result<()> {
    let output_dir = prepare_output_dir(output_dir)?;
    let start = std::time::Instant::now();

    log::info!("Processing {} file(s) into {}", inputs.len(), output_dir.display());

    // One resampler per file, files in parallel
    let outcomes: Vec<_> = inputs
        .par_iter()
        .map(|input| {
            let result = process_file(Path::new(input), &output_dir, config, stop_after);
            (input, result)
        })
        .collect();

    let mut results = Vec::new();
    let mut failed = Vec::new();
    for (input, outcome) in outcomes {
        match outcome {
            Ok(summary) => results.push(summary),
            Err(e) => {
                log::warn!("Failed to process {}: {:#}", input, e);
                failed.push(serde_json::json!({
                    "input_file": input,
                    "error": format!("{:#}", e),
                }));
            }
        }
    }

    let status = if failed.is_empty() { "success" } else { "partial" };
    print_json(&serde_json::json!({
        "status": status,
        "target_sample_rate": config.resampler.target_sample_rate,
        "frame_samples": config.resampler.frame_samples,
        "results": results,
        "failed": failed,
        "processing_time_seconds": start.elapsed().as_secs_f64(),
    }));

    if results.is_empty() {
        anyhow::bail!("No input file could be processed");
    }

    Ok(())
}
