//! Pull-based frame iterator

use super::{FramePair, StreamResampler};
use std::borrow::BorrowMut;

/// Yields one [`FramePair`] per resumption, pulling input samples only as far
/// as needed to complete the next frame.
///
/// Ends when the input iterator ends. Fed from an unbounded source such as a
/// channel receiver it keeps producing frames for as long as samples arrive.
pub struct FrameStream<R, I> {
    resampler: R,
    input: I,
}

impl<R, I> FrameStream<R, I>
where
    R: BorrowMut<StreamResampler>,
    I: Iterator<Item = f32>,
{
    pub(super) fn new(resampler: R, input: I) -> Self {
        Self { resampler, input }
    }

    pub fn resampler(&self) -> &StreamResampler {
        self.resampler.borrow()
    }

    /// Stop streaming and hand back the converter, carry buffer intact
    pub fn into_inner(self) -> R {
        self.resampler
    }
}

impl<R, I> Iterator for FrameStream<R, I>
where
    R: BorrowMut<StreamResampler>,
    I: Iterator<Item = f32>,
{
    type Item = FramePair;

    fn next(&mut self) -> Option<FramePair> {
        let resampler = self.resampler.borrow_mut();
        for sample in self.input.by_ref() {
            if let Some(frame) = resampler.push_sample(sample) {
                return Some(frame);
            }
        }
        None
    }
}
