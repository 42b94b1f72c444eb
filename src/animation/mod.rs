pub mod playback;

pub use playback::{frame_after, Millis, PlaybackState, Step};
