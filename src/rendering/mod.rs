pub mod sprite_renderer;
pub mod strip;
pub mod surface;

pub use sprite_renderer::draw_frame;
pub use strip::compose_strip;
pub use surface::{RasterSurface, Surface};
