//! Audio-callback host around the resampler
//!
//! Mirrors a render-quantum processor: each callback hands over one input
//! chunk, completed frames are posted to the host port, and a `SpeechStop`
//! arriving on the control channel ends processing.

use crate::config::DEFAULT_TARGET_SAMPLE_RATE;
use crate::error::ResamplerError;
use crate::messages::Message;
use crate::resampler::{ResamplerConfig, StreamResampler};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Options supplied by the host when the processor is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorOptions {
    pub frame_samples: usize,
    pub target_sample_rate: u32,
}

impl ProcessorOptions {
    pub fn new(frame_samples: usize) -> Self {
        Self {
            frame_samples,
            target_sample_rate: DEFAULT_TARGET_SAMPLE_RATE,
        }
    }
}

pub struct FrameProcessor {
    resampler: StreamResampler,
    port: UnboundedSender<Message>,
    control: UnboundedReceiver<Message>,
    stop_processing: bool,
}

impl FrameProcessor {
    pub fn new(
        options: ProcessorOptions,
        native_sample_rate: u32,
        port: UnboundedSender<Message>,
        control: UnboundedReceiver<Message>,
    ) -> Result<Self, ResamplerError> {
        log::debug!("initializing processor at {} Hz", native_sample_rate);

        let resampler = StreamResampler::new(ResamplerConfig::new(
            native_sample_rate,
            options.target_sample_rate,
            options.frame_samples,
        ))?;

        log::debug!("initialized processor");

        Ok(Self {
            resampler,
            port,
            control,
            stop_processing: false,
        })
    }

    pub fn resampler(&self) -> &StreamResampler {
        &self.resampler
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_processing
    }

    /// Handle one callback. Returns `false` once the processor should be
    /// retired by its host.
    pub fn process(&mut self, input: Option<&[f32]>) -> bool {
        self.poll_control();
        if self.stop_processing {
            return false;
        }

        let Some(chunk) = input else {
            return true;
        };

        for frame in self.resampler.push(chunk) {
            if self.port.send(Message::AudioFrame(frame)).is_err() {
                log::warn!("host port closed, stopping processor");
                self.stop_processing = true;
                return false;
            }
        }

        true
    }

    /// Consume the processor, returning the samples still waiting for a frame
    pub fn into_buffered(self) -> Vec<f32> {
        self.resampler.into_buffered()
    }

    fn poll_control(&mut self) {
        loop {
            match self.control.try_recv() {
                Ok(Message::SpeechStop) => {
                    log::debug!("speech stop received");
                    self.stop_processing = true;
                }
                Ok(other) => log::debug!("ignoring control message {:?}", other),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
    }
}
