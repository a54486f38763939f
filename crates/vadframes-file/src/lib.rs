//! vad-frames frame file format library

pub mod format;
pub mod reader;
pub mod writer;

pub use format::{FrameFile, FrameHeader, FrameMetadata, StoredFrame, HEADER_SIZE, MAGIC, VERSION};
pub use reader::FrameReader;
pub use writer::FrameWriter;
