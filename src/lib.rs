pub mod animation;
pub mod data;
pub mod player;
pub mod rendering;
pub mod scheduling;
pub mod video;

pub use animation::{Millis, PlaybackState};
pub use data::{AnimationParams, ConfigError, ImageSource, LoadError, SheetCache, SheetGeometry};
pub use player::{PlayerHandle, PlayerStatus};
pub use rendering::{RasterSurface, Surface};
pub use scheduling::{FixedRateDriver, RefreshHost, RefreshScheduler};
