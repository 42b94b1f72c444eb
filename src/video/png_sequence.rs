use crate::video::FrameSink;
use anyhow::{Context, Result};
use image::RgbaImage;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes each frame as `frame_00000.png`, `frame_00001.png`, ... into a directory
pub struct PngSequenceWriter {
    dir: PathBuf,
    frames: u64,
}

impl PngSequenceWriter {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create frame directory {:?}", dir))?;

        log::info!("Writing PNG frames to {:?}", dir);

        Ok(Self { dir, frames: 0 })
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.dir.join(format!("frame_{:05}.png", index))
    }
}

impl FrameSink for PngSequenceWriter {
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<()> {
        let path = self.frame_path(self.frames);
        frame
            .save(&path)
            .with_context(|| format!("Failed to write frame {:?}", path))?;
        self.frames += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        log::info!("Wrote {} PNG frames to {:?}", self.frames, self.dir);
        Ok(())
    }
}
