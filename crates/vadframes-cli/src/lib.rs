//! Shared plumbing for the vad-frames command line tools

pub mod output;
pub mod pipeline;
