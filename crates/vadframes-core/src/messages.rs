//! Messages exchanged between the processor and its host

use crate::resampler::FramePair;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "message", rename_all = "snake_case")]
pub enum Message {
    /// Processor -> host: one resampled frame with its native span
    AudioFrame(FramePair),
    /// Host -> processor: stop consuming input
    SpeechStop,
}
