use crate::data::ImageSource;
use image::RgbaImage;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("failed to read {path:?}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("failed to fetch {url}: {message}")]
    Network { url: String, message: String },
    #[error("failed to decode sprite sheet: {0}")]
    Decode(String),
    #[error("sprite sheet is {width}x{height} but the frame range needs {required_width}x{required_height}")]
    TooSmall {
        width: u32,
        height: u32,
        required_width: u64,
        required_height: u64,
    },
    #[error("sprite sheet loader exited without a result")]
    Abandoned,
}

/// A decoded sheet shared read-only between players
pub type SharedSheet = Arc<RgbaImage>;

pub type LoadResult = Result<SharedSheet, LoadError>;

/// Fetch and decode a sprite sheet to RGBA8 (blocking)
pub fn load_image(source: &ImageSource) -> Result<RgbaImage, LoadError> {
    let bytes: Vec<u8> = match source {
        ImageSource::File(path) => std::fs::read(path).map_err(|e| LoadError::Io {
            path: path.clone(),
            message: e.to_string(),
        })?,
        ImageSource::Url(url) => fetch(url)?,
        ImageSource::Bytes(data) => data.to_vec(),
    };

    let img = image::load_from_memory(&bytes)
        .map_err(|e| LoadError::Decode(e.to_string()))?
        .to_rgba8();

    log::info!(
        "Loaded sprite sheet: {}x{} from {}",
        img.width(),
        img.height(),
        source
    );

    Ok(img)
}

fn fetch(url: &str) -> Result<Vec<u8>, LoadError> {
    let network = |e: reqwest::Error| LoadError::Network {
        url: url.to_string(),
        message: e.to_string(),
    };

    let response = reqwest::blocking::get(url)
        .map_err(network)?
        .error_for_status()
        .map_err(network)?;

    Ok(response.bytes().map_err(network)?.to_vec())
}

enum PendingState {
    Ready(LoadResult),
    Waiting(Receiver<LoadResult>),
    Taken,
}

/// Handle to a sheet that may still be decoding.
///
/// `poll` never blocks and hands out the result exactly once.
pub struct PendingSheet {
    state: PendingState,
}

impl PendingSheet {
    pub fn ready(result: LoadResult) -> Self {
        Self {
            state: PendingState::Ready(result),
        }
    }

    /// Wrap a channel fed by some other loader
    pub fn from_receiver(receiver: Receiver<LoadResult>) -> Self {
        Self {
            state: PendingState::Waiting(receiver),
        }
    }

    pub fn poll(&mut self) -> Option<LoadResult> {
        match std::mem::replace(&mut self.state, PendingState::Taken) {
            PendingState::Ready(result) => Some(result),
            PendingState::Waiting(receiver) => match receiver.try_recv() {
                Ok(result) => Some(result),
                Err(TryRecvError::Empty) => {
                    self.state = PendingState::Waiting(receiver);
                    None
                }
                Err(TryRecvError::Disconnected) => Some(Err(LoadError::Abandoned)),
            },
            PendingState::Taken => None,
        }
    }

    /// Block until the result is available
    pub fn wait(mut self) -> LoadResult {
        match std::mem::replace(&mut self.state, PendingState::Taken) {
            PendingState::Ready(result) => result,
            PendingState::Waiting(receiver) => receiver.recv().unwrap_or(Err(LoadError::Abandoned)),
            PendingState::Taken => Err(LoadError::Abandoned),
        }
    }
}

static GLOBAL_CACHE: Lazy<SheetCache> = Lazy::new(SheetCache::new);

#[derive(Default)]
struct CacheState {
    sheets: HashMap<ImageSource, Weak<RgbaImage>>,
    /// Requesters waiting on a decode that is already running
    in_flight: HashMap<ImageSource, Vec<Sender<LoadResult>>>,
}

impl CacheState {
    fn live(&mut self, source: &ImageSource) -> Option<SharedSheet> {
        let sheet = self.sheets.get(source).and_then(Weak::upgrade);
        if sheet.is_none() {
            self.sheets.remove(source);
        }
        sheet
    }

    /// A sheet that is still alive wins over a fresh decode of the same source
    fn store(&mut self, source: ImageSource, image: RgbaImage) -> SharedSheet {
        if let Some(sheet) = self.live(&source) {
            return sheet;
        }
        let sheet = Arc::new(image);
        self.sheets.insert(source, Arc::downgrade(&sheet));
        sheet
    }
}

/// Decoded sheets keyed by source.
///
/// The cache only holds weak references: a sheet is freed once the last
/// player using it is gone. Failed loads are never cached, and concurrent
/// requests for the same source share one decode.
#[derive(Clone, Default)]
pub struct SheetCache {
    state: Arc<Mutex<CacheState>>,
}

impl SheetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache
    pub fn global() -> &'static SheetCache {
        &GLOBAL_CACHE
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        // The maps hold only finished entries, so a poisoned lock is still consistent
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, source: &ImageSource) -> Option<SharedSheet> {
        self.state().live(source)
    }

    pub fn insert(&self, source: ImageSource, image: RgbaImage) -> SharedSheet {
        self.state().store(source, image)
    }

    /// Number of sheets still in use
    pub fn len(&self) -> usize {
        let mut state = self.state();
        state.sheets.retain(|_, sheet| sheet.strong_count() > 0);
        state.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start loading `source` on the rayon pool. A cached sheet is ready
    /// immediately and a request for a source already decoding joins that load.
    pub fn request(&self, source: ImageSource) -> PendingSheet {
        let (tx, rx) = mpsc::channel();
        {
            let mut state = self.state();
            if let Some(sheet) = state.live(&source) {
                log::debug!("Sprite sheet cache hit: {}", source);
                return PendingSheet::ready(Ok(sheet));
            }
            if let Some(waiters) = state.in_flight.get_mut(&source) {
                log::debug!("Sprite sheet already loading: {}", source);
                waiters.push(tx);
                return PendingSheet::from_receiver(rx);
            }
            state.in_flight.insert(source.clone(), vec![tx]);
        }

        let cache = self.clone();
        rayon::spawn(move || {
            let loaded = load_image(&source);
            let (result, waiters) = {
                let mut state = cache.state();
                let result = loaded.map(|image| state.store(source.clone(), image));
                (result, state.in_flight.remove(&source).unwrap_or_default())
            };

            // Requesting players may already be gone. The first waiter takes
            // the result itself so no strong reference outlives the hand-off.
            let mut waiters = waiters.into_iter();
            let first = waiters.next();
            for tx in waiters {
                let _ = tx.send(result.clone());
            }
            if let Some(tx) = first {
                let _ = tx.send(result);
            }
        });

        PendingSheet::from_receiver(rx)
    }

    /// Load on the calling thread, going through the cache
    pub fn load_blocking(&self, source: ImageSource) -> LoadResult {
        if let Some(sheet) = self.get(&source) {
            return Ok(sheet);
        }
        let image = load_image(&source)?;
        Ok(self.insert(source, image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([200, 40, 40, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_from_memory() {
        let source = ImageSource::from(png_bytes(32, 16));
        let img = load_image(&source).unwrap();
        assert_eq!(img.dimensions(), (32, 16));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = ImageSource::parse("/definitely/not/here/knight.png");
        assert!(matches!(load_image(&source), Err(LoadError::Io { .. })));
    }

    #[test]
    fn test_garbage_bytes_is_decode_error() {
        let source = ImageSource::from(vec![1u8, 2, 3, 4]);
        assert!(matches!(load_image(&source), Err(LoadError::Decode(_))));
    }

    #[test]
    fn test_cache_shares_decoded_sheet() {
        let cache = SheetCache::new();
        let source = ImageSource::from(png_bytes(8, 8));

        let first = cache.request(source.clone()).wait().unwrap();
        let second = cache.request(source.clone()).wait().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_requests_share_one_decode() {
        let cache = SheetCache::new();
        let source = ImageSource::from(png_bytes(12, 6));

        let first = cache.request(source.clone());
        let second = cache.request(source.clone());

        let first = first.wait().unwrap();
        let second = second.wait().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_sheet_released_with_last_user() {
        let cache = SheetCache::new();
        let source = ImageSource::from(png_bytes(8, 4));

        let sheet = cache.load_blocking(source.clone()).unwrap();
        let again = cache.get(&source).unwrap();
        assert!(Arc::ptr_eq(&sheet, &again));
        assert_eq!(Arc::strong_count(&sheet), 2);

        drop(again);
        drop(sheet);
        assert!(cache.get(&source).is_none());
        assert!(cache.is_empty());

        // A later request decodes afresh
        let reloaded = cache.request(source.clone()).wait().unwrap();
        assert_eq!(reloaded.dimensions(), (8, 4));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_global_cache_is_shared() {
        assert!(std::ptr::eq(SheetCache::global(), SheetCache::global()));

        let source = ImageSource::from(png_bytes(5, 3));
        let first = SheetCache::global().request(source.clone()).wait().unwrap();
        let second = SheetCache::global().load_blocking(source.clone()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(SheetCache::global().get(&source).is_some());
    }

    #[test]
    fn test_failed_load_not_cached() {
        let cache = SheetCache::new();
        let source = ImageSource::from(vec![0u8; 3]);

        assert!(cache.load_blocking(source.clone()).is_err());
        assert!(cache.get(&source).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_pending_yields_once() {
        let (tx, rx) = mpsc::channel();
        let mut pending = PendingSheet::from_receiver(rx);
        assert!(pending.poll().is_none());

        tx.send(Ok(Arc::new(RgbaImage::new(4, 4)))).unwrap();
        assert!(matches!(pending.poll(), Some(Ok(_))));
        assert!(pending.poll().is_none());
    }

    #[test]
    fn test_pending_reports_abandoned_loader() {
        let (tx, rx) = mpsc::channel::<LoadResult>();
        let mut pending = PendingSheet::from_receiver(rx);
        drop(tx);
        assert_eq!(pending.poll().map(|r| r.err()), Some(Some(LoadError::Abandoned)));
    }
}
