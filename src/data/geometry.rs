use thiserror::Error;

/// Rejected player configuration. Raised before any loop is started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("frame width must be greater than zero")]
    ZeroFrameWidth,
    #[error("frame height must be greater than zero")]
    ZeroFrameHeight,
    #[error("sprite sheet must have at least one column")]
    ZeroColumns,
    #[error("start frame {start} is after end frame {end}")]
    InvertedRange { start: u32, end: u32 },
    #[error("frame delay must be greater than zero milliseconds")]
    ZeroFrameDelay,
    #[error("drawing surface {width}x{height} has no area")]
    EmptySurface { width: u32, height: u32 },
    #[error("frame range needs a {width}x{height} sheet, larger than any image")]
    SheetTooLarge { width: u64, height: u64 },
}

/// Source region of one frame inside the sheet, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Validated grid layout of a sprite sheet plus the looped frame range.
///
/// Frames are numbered row-major from the top-left cell, `columns` per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetGeometry {
    frame_width: u32,
    frame_height: u32,
    columns: u32,
    start_frame: u32,
    end_frame: u32,
}

impl SheetGeometry {
    pub fn new(
        frame_width: u32,
        frame_height: u32,
        columns: u32,
        start_frame: u32,
        end_frame: u32,
    ) -> Result<Self, ConfigError> {
        if frame_width == 0 {
            return Err(ConfigError::ZeroFrameWidth);
        }
        if frame_height == 0 {
            return Err(ConfigError::ZeroFrameHeight);
        }
        if columns == 0 {
            return Err(ConfigError::ZeroColumns);
        }
        if start_frame > end_frame {
            return Err(ConfigError::InvertedRange {
                start: start_frame,
                end: end_frame,
            });
        }

        let geometry = Self {
            frame_width,
            frame_height,
            columns,
            start_frame,
            end_frame,
        };

        // Every frame offset in the loop must be addressable in u32 pixels
        let (width, height) = geometry.required_extent();
        if width > u32::MAX as u64 || height > u32::MAX as u64 {
            return Err(ConfigError::SheetTooLarge { width, height });
        }

        Ok(geometry)
    }

    pub fn frame_width(&self) -> u32 {
        self.frame_width
    }

    pub fn frame_height(&self) -> u32 {
        self.frame_height
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn start_frame(&self) -> u32 {
        self.start_frame
    }

    pub fn end_frame(&self) -> u32 {
        self.end_frame
    }

    /// Number of frames in the loop, both ends included
    pub fn loop_len(&self) -> u64 {
        (self.end_frame - self.start_frame) as u64 + 1
    }

    pub fn contains(&self, frame: u32) -> bool {
        (self.start_frame..=self.end_frame).contains(&frame)
    }

    /// Map a frame index to its source region
    /// sx = (frame % columns) * frame_width, sy = floor(frame / columns) * frame_height
    ///
    /// Exact for every frame in the loop; offsets past `u32::MAX` saturate.
    pub fn source_rect(&self, frame: u32) -> FrameRect {
        FrameRect {
            x: (frame % self.columns).saturating_mul(self.frame_width),
            y: (frame / self.columns).saturating_mul(self.frame_height),
            width: self.frame_width,
            height: self.frame_height,
        }
    }

    /// Smallest image size that holds every frame of the loop
    pub fn required_extent(&self) -> (u64, u64) {
        let first_row = self.start_frame / self.columns;
        let last_row = self.end_frame / self.columns;

        // A range spanning rows touches every column
        let cells_wide = if first_row == last_row {
            (self.end_frame % self.columns) as u64 + 1
        } else {
            self.columns as u64
        };

        (
            cells_wide * self.frame_width as u64,
            (last_row as u64 + 1) * self.frame_height as u64,
        )
    }

    pub fn fits(&self, image_width: u32, image_height: u32) -> bool {
        let (width, height) = self.required_extent();
        image_width as u64 >= width && image_height as u64 >= height
    }

    /// Whole frames the image holds when read with this grid
    pub fn frames_available(&self, image_width: u32, image_height: u32) -> u64 {
        let per_row = (image_width / self.frame_width).min(self.columns) as u64;
        let rows = (image_height / self.frame_height) as u64;
        if per_row < self.columns as u64 {
            // A partial first row is all that can be indexed row-major
            if rows == 0 {
                0
            } else {
                per_row
            }
        } else {
            per_row * rows
        }
    }
}

impl Default for SheetGeometry {
    /// 64x64 frames, 12 per row, frames 0..=26
    fn default() -> Self {
        Self {
            frame_width: 64,
            frame_height: 64,
            columns: 12,
            start_frame: 0,
            end_frame: 26,
        }
    }
}

/// Unvalidated animation parameters as supplied by a caller or config file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationParams {
    pub frame_width: u32,
    pub frame_height: u32,
    pub columns: u32,
    pub start_frame: u32,
    pub end_frame: u32,
    pub frame_delay_ms: u32,
}

impl AnimationParams {
    pub fn geometry(&self) -> Result<SheetGeometry, ConfigError> {
        SheetGeometry::new(
            self.frame_width,
            self.frame_height,
            self.columns,
            self.start_frame,
            self.end_frame,
        )
    }

    /// Validate everything, returning the grid and the frame delay
    pub fn validate(&self) -> Result<(SheetGeometry, u32), ConfigError> {
        let geometry = self.geometry()?;
        if self.frame_delay_ms == 0 {
            return Err(ConfigError::ZeroFrameDelay);
        }
        Ok((geometry, self.frame_delay_ms))
    }
}

impl Default for AnimationParams {
    fn default() -> Self {
        let geometry = SheetGeometry::default();
        Self {
            frame_width: geometry.frame_width,
            frame_height: geometry.frame_height,
            columns: geometry.columns,
            start_frame: geometry.start_frame,
            end_frame: geometry.end_frame,
            frame_delay_ms: 90,
        }
    }
}
