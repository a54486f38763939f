//! Pipeline configuration
//!
//! Defaults follow the browser VAD pipeline: 16 kHz frames of 1536 samples,
//! fed by 128-sample render quanta.

use crate::resampler::ResamplerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Target rate expected by the downstream voice-activity model
pub const DEFAULT_TARGET_SAMPLE_RATE: u32 = 16000;

/// Top-level configuration, loadable from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VadFramesConfig {
    #[serde(default)]
    pub resampler: ResamplerSection,
    #[serde(default)]
    pub capture: CaptureSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResamplerSection {
    #[serde(default = "default_target_sample_rate")]
    pub target_sample_rate: u32,
    #[serde(default = "default_frame_samples")]
    pub frame_samples: usize,
}

impl Default for ResamplerSection {
    fn default() -> Self {
        Self {
            target_sample_rate: default_target_sample_rate(),
            frame_samples: default_frame_samples(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureSection {
    /// Samples handed to the processor per callback
    #[serde(default = "default_render_quantum")]
    pub render_quantum: usize,
}

impl Default for CaptureSection {
    fn default() -> Self {
        Self {
            render_quantum: default_render_quantum(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputSection {
    /// zstd-compress the frame payload
    #[serde(default)]
    pub compress: bool,
    /// Also write the resampled signal as a WAV file
    #[serde(default)]
    pub write_wav: bool,
}

fn default_target_sample_rate() -> u32 {
    DEFAULT_TARGET_SAMPLE_RATE
}
fn default_frame_samples() -> usize {
    1536
}
fn default_render_quantum() -> usize {
    128
}

impl VadFramesConfig {
    /// Load configuration from TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e))?;
        let config: VadFramesConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML config: {}", e))?;
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.resampler.target_sample_rate == 0 {
            anyhow::bail!("target_sample_rate must be > 0");
        }
        if self.resampler.frame_samples == 0 {
            anyhow::bail!("frame_samples must be > 0");
        }
        if self.capture.render_quantum == 0 {
            anyhow::bail!("render_quantum must be > 0");
        }
        Ok(())
    }

    /// Resampler settings for a stream arriving at `native_sample_rate`
    pub fn resampler_config(&self, native_sample_rate: u32) -> ResamplerConfig {
        ResamplerConfig::new(
            native_sample_rate,
            self.resampler.target_sample_rate,
            self.resampler.frame_samples,
        )
    }
}
