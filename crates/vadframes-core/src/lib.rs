//! vad-frames core - streaming resampler for voice-activity pipelines
//!
//! Converts audio arriving at any native rate into fixed-size 16 kHz frames,
//! keeping the native-rate span behind each frame alongside it.

pub mod audio;
pub mod config;
pub mod error;
pub mod messages;
pub mod processor;
pub mod resampler;

pub use config::VadFramesConfig;
pub use error::ResamplerError;
pub use messages::Message;
pub use processor::{FrameProcessor, ProcessorOptions};
pub use resampler::{FramePair, FrameStream, ResamplerConfig, StreamResampler};
