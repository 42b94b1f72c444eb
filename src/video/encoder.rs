use crate::video::FrameSink;
use anyhow::{Context, Result};
use image::RgbaImage;
use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

/// Codec arguments for an output file, picked by extension
fn codec_args(output_path: &Path) -> Result<&'static [&'static str]> {
    let extension = output_path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let args: &'static [&'static str] = match extension.as_str() {
        // ProRes 4444 keeps the alpha channel
        "mov" => &["-c:v", "prores_ks", "-profile:v", "4", "-pix_fmt", "yuva444p10le", "-vendor", "apl0"],
        "webm" => &["-c:v", "libvpx-vp9", "-pix_fmt", "yuva420p", "-auto-alt-ref", "0"],
        "mp4" => &["-c:v", "libx264", "-pix_fmt", "yuv420p", "-crf", "18"],
        "gif" => &["-filter_complex", "split[a][b];[a]palettegen=reserve_transparent=1[p];[b][p]paletteuse"],
        other => anyhow::bail!("Unsupported video extension {:?} (use mov, webm, mp4 or gif)", other),
    };
    Ok(args)
}

pub fn is_video_path(path: &Path) -> bool {
    codec_args(path).is_ok()
}

/// Streams raw RGBA frames into an ffmpeg child process
pub struct FfmpegEncoder {
    process: Child,
    stdin: Option<ChildStdin>,
    width: u32,
    height: u32,
    frames: u64,
}

impl FfmpegEncoder {
    pub fn new<P: AsRef<Path>>(output_path: P, width: u32, height: u32, fps: u32) -> Result<Self> {
        let output_path = output_path.as_ref();
        let codec = codec_args(output_path)?;
        let output = output_path
            .to_str()
            .with_context(|| format!("Output path {:?} is not valid UTF-8", output_path))?;

        log::info!("Starting ffmpeg encoder: {}x{} @ {} fps", width, height, fps);
        log::info!("  output: {:?}", output_path);

        let mut process = Command::new("ffmpeg")
            .args([
                "-y",
                "-f", "rawvideo",
                "-pixel_format", "rgba",
                "-video_size", &format!("{}x{}", width, height),
                "-framerate", &format!("{}", fps),
                "-i", "pipe:0",
            ])
            .args(codec)
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .context("Failed to spawn ffmpeg (is it on PATH?)")?;

        let stdin = process
            .stdin
            .take()
            .context("Failed to open ffmpeg stdin")?;

        Ok(Self {
            process,
            stdin: Some(stdin),
            width,
            height,
            frames: 0,
        })
    }
}

impl FrameSink for FfmpegEncoder {
    fn write_frame(&mut self, frame: &RgbaImage) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            anyhow::bail!(
                "Invalid frame size: expected {}x{}, got {}x{}",
                self.width,
                self.height,
                frame.width(),
                frame.height()
            );
        }

        match &mut self.stdin {
            Some(stdin) => stdin
                .write_all(frame.as_raw())
                .context("Failed to write frame to ffmpeg")?,
            None => anyhow::bail!("ffmpeg stdin is closed"),
        }

        self.frames += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<()> {
        log::info!("Finalizing video encoding ({} frames)...", self.frames);

        // Close stdin to signal end of input
        drop(self.stdin.take());

        let status = self
            .process
            .wait()
            .context("Failed to wait for ffmpeg")?;

        if status.success() {
            log::info!("Video encoding completed successfully");
            Ok(())
        } else {
            anyhow::bail!("ffmpeg exited with errors: {:?}", status);
        }
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        // Try to terminate the encoder if it is still running
        let _ = self.process.kill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_by_extension() {
        assert!(is_video_path(Path::new("out/preview.mov")));
        assert!(is_video_path(Path::new("preview.GIF")));
        assert!(is_video_path(Path::new("preview.webm")));
        assert!(!is_video_path(Path::new("frames")));
        assert!(!is_video_path(Path::new("preview.png")));
    }
}
