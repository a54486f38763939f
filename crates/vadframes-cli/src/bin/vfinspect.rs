//! vfinspect - inspect and verify .vfr frame files
//!
//! Usage: vfinspect <file.vfr> [--frames] [--verify]

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use vadframes_cli::output::{print_json, verify, InspectReport};
use vadframes_file::FrameReader;

#[derive(Parser, Debug)]
#[command(name = "vfinspect")]
#[command(about = "Inspect vad-frames .vfr files", long_about = None)]
struct Args {
    /// Path to the .vfr file
    file: String,

    /// Include every frame in the output
    #[arg(long)]
    frames: bool,

    /// Check frame sizes and sample conservation
    #[arg(long)]
    verify: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Off
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let path = Path::new(&args.file);
    log::info!("Reading: {}", path.display());

    if !args.frames && !args.verify {
        let (header, metadata) = FrameReader::read_summary(path)?;
        print_json(&InspectReport {
            header: &header,
            metadata: &metadata,
            resampled_duration_ms: header.resampled_duration_ms(),
            verification: None,
            frames: None,
        });
        return Ok(());
    }

    let file = FrameReader::read(path)?;
    let verification = args.verify.then(|| verify(&file));
    if let Some(report) = &verification {
        log::info!("Verification: {} problem(s)", report.problems.len());
    }
    let failed = verification.as_ref().is_some_and(|v| !v.ok);

    print_json(&InspectReport {
        header: &file.header,
        metadata: &file.metadata,
        resampled_duration_ms: file.header.resampled_duration_ms(),
        verification,
        frames: args.frames.then_some(file.frames.as_slice()),
    });

    if failed {
        anyhow::bail!("{} failed verification", path.display());
    }

    Ok(())
}
