use crate::data::FrameRect;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// A fixed-size 2D raster target a player draws into
pub trait Surface {
    fn size(&self) -> (u32, u32);

    /// Reset every pixel to transparent
    fn clear(&mut self);

    /// Copy `region` of `sheet` onto the whole surface, scaling to fit
    fn draw_region(&mut self, sheet: &RgbaImage, region: FrameRect);
}

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// CPU surface backed by an RGBA image
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixels: RgbaImage,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, TRANSPARENT),
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|p| p[3] == 0)
    }
}

impl Surface for RasterSurface {
    fn size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn clear(&mut self) {
        self.pixels.pixels_mut().for_each(|p| *p = TRANSPARENT);
    }

    fn draw_region(&mut self, sheet: &RgbaImage, region: FrameRect) {
        let frame = imageops::crop_imm(sheet, region.x, region.y, region.width, region.height).to_image();
        if frame.dimensions() != (region.width, region.height) {
            log::warn!(
                "Frame region {:?} runs past the {}x{} sheet",
                region,
                sheet.width(),
                sheet.height()
            );
            if frame.width() == 0 || frame.height() == 0 {
                return;
            }
        }

        let (width, height) = self.size();
        if frame.dimensions() == (width, height) {
            imageops::replace(&mut self.pixels, &frame, 0, 0);
        } else {
            // Nearest-neighbor keeps pixel-art frames crisp when scaled
            let scaled = imageops::resize(&frame, width, height, FilterType::Nearest);
            imageops::replace(&mut self.pixels, &scaled, 0, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 2x1 grid of 2x2 frames: left red, right blue
    fn two_frame_sheet() -> RgbaImage {
        RgbaImage::from_fn(4, 2, |x, _| {
            if x < 2 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })
    }

    #[test]
    fn test_new_surface_is_blank() {
        let surface = RasterSurface::new(8, 8);
        assert!(surface.is_blank());
        assert_eq!(surface.size(), (8, 8));
    }

    #[test]
    fn test_draw_copies_region() {
        let sheet = two_frame_sheet();
        let mut surface = RasterSurface::new(2, 2);

        surface.draw_region(&sheet, FrameRect { x: 2, y: 0, width: 2, height: 2 });
        assert!(surface.pixels().pixels().all(|p| *p == Rgba([0, 0, 255, 255])));
    }

    #[test]
    fn test_draw_scales_to_surface() {
        let sheet = two_frame_sheet();
        let mut surface = RasterSurface::new(6, 6);

        surface.draw_region(&sheet, FrameRect { x: 0, y: 0, width: 2, height: 2 });
        assert!(surface.pixels().pixels().all(|p| *p == Rgba([255, 0, 0, 255])));
    }

    #[test]
    fn test_clear_removes_previous_frame() {
        let sheet = two_frame_sheet();
        let mut surface = RasterSurface::new(2, 2);

        surface.draw_region(&sheet, FrameRect { x: 0, y: 0, width: 2, height: 2 });
        assert!(!surface.is_blank());
        surface.clear();
        assert!(surface.is_blank());
    }
}
