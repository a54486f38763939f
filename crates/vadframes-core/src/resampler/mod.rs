//! Streaming boxcar resampler
//!
//! Turns an unbounded stream of native-rate samples into fixed-size frames at a
//! lower target rate. Every output slot is the mean of the native samples that
//! map onto it, and the native span behind each frame is returned with it.

mod stream;


pub use stream::FrameStream;

use crate::error::ResamplerError;
use serde::{Deserialize, Serialize};

/// Native rates below this produce a warning at construction
pub const MIN_NATIVE_SAMPLE_RATE: u32 = 16000;

/// Rates and frame length, fixed for the lifetime of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResamplerConfig {
    /// Sampling rate of the incoming signal (Hz)
    pub native_sample_rate: u32,
    /// Sampling rate of emitted frames (Hz)
    pub target_sample_rate: u32,
    /// Samples per emitted frame, at the target rate
    pub target_frame_size: usize,
}

impl ResamplerConfig {
    pub fn new(native_sample_rate: u32, target_sample_rate: u32, target_frame_size: usize) -> Self {
        Self {
            native_sample_rate,
            target_sample_rate,
            target_frame_size,
        }
    }

    /// Reject configurations that would leave an output slot without input
    pub fn validate(&self) -> Result<(), ResamplerError> {
        if self.native_sample_rate == 0 {
            return Err(ResamplerError::ZeroNativeRate);
        }
        if self.target_sample_rate == 0 {
            return Err(ResamplerError::ZeroTargetRate);
        }
        if self.target_frame_size == 0 {
            return Err(ResamplerError::ZeroFrameSize);
        }
        if self.target_sample_rate > self.native_sample_rate {
            return Err(ResamplerError::Upsampling {
                native: self.native_sample_rate,
                target: self.target_sample_rate,
            });
        }
        Ok(())
    }

    /// Native rate is under the supported minimum; processing still works
    pub fn below_recommended_rate(&self) -> bool {
        self.native_sample_rate < MIN_NATIVE_SAMPLE_RATE
    }

    /// Native samples consumed by every frame
    pub fn samples_per_frame(&self) -> usize {
        self.boundary(self.target_frame_size - 1)
    }

    /// Smallest buffer length for which a frame can be produced
    pub fn frame_threshold(&self) -> usize {
        let native = self.native_sample_rate as u128;
        let target = self.target_sample_rate as u128;
        ((self.target_frame_size as u128 * native + target - 1) / target) as usize
    }

    /// Exclusive end of the native window feeding output slot `slot`:
    /// floor((slot + 1) * native / target)
    fn boundary(&self, slot: usize) -> usize {
        ((slot as u128 + 1) * self.native_sample_rate as u128 / self.target_sample_rate as u128)
            as usize
    }

    /// buffered * target / native >= frame_size, without rounding
    fn has_enough(&self, buffered: usize) -> bool {
        buffered as u128 * self.target_sample_rate as u128
            >= self.target_frame_size as u128 * self.native_sample_rate as u128
    }
}

/// One emitted frame and the native samples it was averaged from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramePair {
    /// Exactly `target_frame_size` samples at the target rate
    pub resampled: Vec<f32>,
    /// The native-rate span consumed to build `resampled`
    pub original: Vec<f32>,
}

/// Stateful converter for a single stream.
///
/// Not meant to be shared: each stream gets its own instance, and calls to one
/// instance must be serialized by the host.
#[derive(Debug, Clone)]
pub struct StreamResampler {
    config: ResamplerConfig,
    buffer: Vec<f32>,
    frames_emitted: u64,
}

impl StreamResampler {
    pub fn new(config: ResamplerConfig) -> Result<Self, ResamplerError> {
        config.validate()?;

        if config.below_recommended_rate() {
            log::warn!(
                "native sample rate {} Hz is too low, expected {} <= target ({} Hz) <= native",
                config.native_sample_rate,
                MIN_NATIVE_SAMPLE_RATE,
                config.target_sample_rate
            );
        }

        Ok(Self {
            config,
            buffer: Vec::with_capacity(config.frame_threshold()),
            frames_emitted: 0,
        })
    }

    pub fn config(&self) -> &ResamplerConfig {
        &self.config
    }

    /// Native samples waiting for the next frame
    pub fn buffered(&self) -> &[f32] {
        &self.buffer
    }

    /// Number of frames produced so far
    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    /// Whether the carry buffer holds enough samples for a full frame
    pub fn ready(&self) -> bool {
        self.config.has_enough(self.buffer.len())
    }

    /// Feed a chunk and collect every frame it completes, in order.
    ///
    /// Behaves as if the samples were appended one at a time with a readiness
    /// check after each append. Appending stops exactly where the threshold is
    /// reached, so chunk boundaries never change the output.
    pub fn push(&mut self, samples: &[f32]) -> Vec<FramePair> {
        let mut frames = Vec::new();
        let mut rest = samples;

        while !rest.is_empty() {
            let take = self.missing().min(rest.len());
            let (head, tail) = rest.split_at(take);
            self.buffer.extend_from_slice(head);
            rest = tail;

            while self.ready() {
                frames.push(self.generate_frame());
            }
        }

        frames
    }

    /// Append a single sample, returning the frame it completes if any
    pub fn push_sample(&mut self, sample: f32) -> Option<FramePair> {
        self.buffer.push(sample);
        if !self.ready() {
            return None;
        }

        let frame = self.generate_frame();
        // Each frame leaves fewer than frame_threshold() samples behind
        debug_assert!(!self.ready());
        Some(frame)
    }

    /// Lazy form of [`push`](Self::push) borrowing this converter
    pub fn stream<I>(&mut self, input: I) -> FrameStream<&mut Self, I::IntoIter>
    where
        I: IntoIterator<Item = f32>,
    {
        FrameStream::new(self, input.into_iter())
    }

    /// Lazy form that takes ownership; recover the converter with
    /// [`FrameStream::into_inner`]
    pub fn into_stream<I>(self, input: I) -> FrameStream<Self, I::IntoIter>
    where
        I: IntoIterator<Item = f32>,
    {
        FrameStream::new(self, input.into_iter())
    }

    /// Consume the converter, returning the samples that never made a frame
    pub fn into_buffered(self) -> Vec<f32> {
        self.buffer
    }

    /// Samples still needed before the next readiness check can pass
    fn missing(&self) -> usize {
        self.config
            .frame_threshold()
            .saturating_sub(self.buffer.len())
            .max(1)
    }

    fn generate_frame(&mut self) -> FramePair {
        let frame_size = self.config.target_frame_size;
        let mut resampled = Vec::with_capacity(frame_size);
        let mut start = 0;

        for slot in 0..frame_size {
            let end = self.config.boundary(slot);
            let window = &self.buffer[start..end];

            // validate() guarantees every window holds at least one sample
            let sum: f64 = window.iter().map(|&s| s as f64).sum();
            resampled.push((sum / window.len() as f64) as f32);

            start = end;
        }

        let original: Vec<f32> = self.buffer.drain(..start).collect();
        self.frames_emitted += 1;

        log::trace!(
            "frame {}: {} native samples -> {} slots, {} carried over",
            self.frames_emitted,
            original.len(),
            frame_size,
            self.buffer.len()
        );

        FramePair {
            resampled,
            original,
        }
    }
}
