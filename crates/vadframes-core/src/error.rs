//! Errors raised when a resampler is configured with unusable rates

use thiserror::Error;

/// Configuration rejected at construction time
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResamplerError {
    #[error("native sample rate must be > 0")]
    ZeroNativeRate,

    #[error("target sample rate must be > 0")]
    ZeroTargetRate,

    #[error("target frame size must be > 0")]
    ZeroFrameSize,

    /// Upsampling leaves some output slots without any input sample
    #[error("target sample rate {target} Hz exceeds native sample rate {native} Hz")]
    Upsampling { native: u32, target: u32 },
}
