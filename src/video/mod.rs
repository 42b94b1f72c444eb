pub mod encoder;
pub mod png_sequence;

pub use encoder::{is_video_path, FfmpegEncoder};
pub use png_sequence::PngSequenceWriter;

use anyhow::Result;
use image::RgbaImage;
use std::path::Path;

/// Destination for rendered refreshes
pub trait FrameSink {
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<()>;

    /// Flush and close the output
    fn finish(self: Box<Self>) -> Result<()>;
}

/// A video file for known video extensions, otherwise a PNG frame directory
pub fn open_sink(output: &Path, width: u32, height: u32, fps: u32) -> Result<Box<dyn FrameSink>> {
    if is_video_path(output) {
        Ok(Box::new(FfmpegEncoder::new(output, width, height, fps)?))
    } else {
        Ok(Box::new(PngSequenceWriter::new(output)?))
    }
}
