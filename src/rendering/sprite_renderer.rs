use crate::data::SheetGeometry;
use crate::rendering::Surface;
use image::RgbaImage;

/// Draw one frame of `sheet` onto `surface`, clearing the previous frame first
pub fn draw_frame<S: Surface + ?Sized>(
    surface: &mut S,
    sheet: &RgbaImage,
    geometry: &SheetGeometry,
    frame: u32,
) {
    let region = geometry.source_rect(frame);
    log::trace!("Drawing frame {} from {:?}", frame, region);

    surface.clear();
    surface.draw_region(sheet, region);
}
