pub mod geometry;
pub mod image_source;
pub mod player_config;
pub mod sheet_loader;

pub use geometry::{AnimationParams, ConfigError, FrameRect, SheetGeometry};
pub use image_source::ImageSource;
pub use player_config::{AssetManifest, GridOverrides, PlayerConfig, SpriteAsset};
pub use sheet_loader::{load_image, LoadError, LoadResult, PendingSheet, SharedSheet, SheetCache};
