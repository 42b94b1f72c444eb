use image::imageops;
use image::{Rgba, RgbaImage};

/// Lay frames out left to right with `gap` transparent pixels between them.
/// Shorter frames are top-aligned.
pub fn compose_strip(frames: &[&RgbaImage], gap: u32) -> RgbaImage {
    if frames.is_empty() {
        return RgbaImage::new(0, 0);
    }

    let width = frames.iter().map(|f| f.width()).sum::<u32>() + gap * (frames.len() as u32 - 1);
    let height = frames.iter().map(|f| f.height()).max().unwrap_or(0);

    let mut strip = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    let mut x = 0i64;
    for frame in frames {
        imageops::replace(&mut strip, *frame, x, 0);
        x += frame.width() as i64 + gap as i64;
    }

    strip
}
