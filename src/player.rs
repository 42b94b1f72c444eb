//! Sprite sheet animation player.
//!
//! A player subscribes to a refresh host, waits for its sheet to finish
//! decoding, then draws its frame range in an endless loop at a fixed cadence.
//! Load failures never reach the host: the surface stays blank, the failure is
//! logged and [`PlayerStatus::Failed`] records the reason.

use crate::animation::{Millis, PlaybackState};
use crate::data::{
    AnimationParams, ConfigError, ImageSource, LoadError, LoadResult, PendingSheet, SharedSheet,
    SheetCache, SheetGeometry,
};
use crate::rendering::{draw_frame, Surface};
use crate::scheduling::{RefreshHost, RefreshScheduler, SubscriptionId};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerStatus {
    /// Waiting for the sheet to decode
    Loading,
    Playing,
    /// The sheet could not be used; the surface stays blank
    Failed(String),
    Destroyed,
}

struct PlayerCore<S> {
    label: String,
    geometry: SheetGeometry,
    frame_delay_ms: u32,
    pending: Option<PendingSheet>,
    sheet: Option<SharedSheet>,
    playback: Option<PlaybackState>,
    surface: S,
    status: PlayerStatus,
    draws: u64,
}

impl<S: Surface> PlayerCore<S> {
    fn on_tick(&mut self, now: Millis) {
        if self.sheet.is_none() && !self.poll_load(now) {
            return;
        }

        let (Some(sheet), Some(state)) = (self.sheet.as_ref(), self.playback) else {
            return;
        };

        let step = state.advance(&self.geometry, self.frame_delay_ms, now);
        if let Some(frame) = step.draw {
            draw_frame(&mut self.surface, sheet, &self.geometry, frame);
            self.draws += 1;
        }
        self.playback = Some(step.state);
    }

    /// Returns true once the sheet is ready to play
    fn poll_load(&mut self, now: Millis) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        let Some(result) = pending.poll() else {
            return false;
        };
        self.pending = None;

        match self.check_fits(result) {
            Ok(sheet) => {
                log::info!(
                    "{}: playing frames {}..={} every {} ms",
                    self.label,
                    self.geometry.start_frame(),
                    self.geometry.end_frame(),
                    self.frame_delay_ms
                );
                self.sheet = Some(sheet);
                self.playback = Some(PlaybackState::start(&self.geometry, now));
                self.status = PlayerStatus::Playing;
                true
            }
            Err(e) => {
                log::warn!("{}: sprite sheet unusable, surface stays blank: {}", self.label, e);
                self.status = PlayerStatus::Failed(e.to_string());
                false
            }
        }
    }

    fn check_fits(&self, result: LoadResult) -> LoadResult {
        let sheet = result?;
        let (width, height) = sheet.dimensions();
        if !self.geometry.fits(width, height) {
            let (required_width, required_height) = self.geometry.required_extent();
            return Err(LoadError::TooSmall {
                width,
                height,
                required_width,
                required_height,
            });
        }
        Ok(sheet)
    }
}

/// A running sprite animation. Dropping the handle destroys the player.
pub struct PlayerHandle<S: Surface + 'static, H: RefreshHost = RefreshScheduler> {
    core: Rc<RefCell<PlayerCore<S>>>,
    alive: Rc<Cell<bool>>,
    host: H,
    subscription: SubscriptionId,
}

impl<S: Surface + 'static, H: RefreshHost + Clone> PlayerHandle<S, H> {
    /// Validate the parameters, start loading `source` through `cache` and
    /// subscribe to `host`. Nothing is drawn until the sheet has decoded.
    pub fn create(
        host: &H,
        cache: &SheetCache,
        source: ImageSource,
        params: AnimationParams,
        surface: S,
    ) -> Result<Self, ConfigError> {
        let (geometry, frame_delay_ms) = params.validate()?;
        check_surface(&surface)?;

        let label = source.to_string();
        let pending = cache.request(source);
        Ok(Self::start(host, label, pending, geometry, frame_delay_ms, surface))
    }

    /// Like [`create`](Self::create), with the sheet supplied by the caller
    pub fn with_pending(
        host: &H,
        label: impl Into<String>,
        pending: PendingSheet,
        params: AnimationParams,
        surface: S,
    ) -> Result<Self, ConfigError> {
        let (geometry, frame_delay_ms) = params.validate()?;
        check_surface(&surface)?;
        Ok(Self::start(host, label.into(), pending, geometry, frame_delay_ms, surface))
    }

    fn start(
        host: &H,
        label: String,
        pending: PendingSheet,
        geometry: SheetGeometry,
        frame_delay_ms: u32,
        surface: S,
    ) -> Self {
        log::debug!("{}: created, waiting for sprite sheet", label);

        let core = Rc::new(RefCell::new(PlayerCore {
            label,
            geometry,
            frame_delay_ms,
            pending: Some(pending),
            sheet: None,
            playback: None,
            surface,
            status: PlayerStatus::Loading,
            draws: 0,
        }));
        let alive = Rc::new(Cell::new(true));

        let weak = Rc::downgrade(&core);
        let live = Rc::clone(&alive);
        let subscription = host.register(Box::new(move |now| {
            // A tick dispatched before destroy returned must not draw
            if !live.get() {
                return;
            }
            let Some(core) = weak.upgrade() else {
                return;
            };
            if let Ok(mut core) = core.try_borrow_mut() {
                core.on_tick(now);
            };
        }));

        Self {
            core,
            alive,
            host: host.clone(),
            subscription,
        }
    }
}

impl<S: Surface + 'static, H: RefreshHost> PlayerHandle<S, H> {
    /// Stop the loop and release the refresh subscription. Idempotent; no
    /// draw happens after this returns.
    pub fn destroy(&self) {
        if !self.alive.replace(false) {
            return;
        }
        self.host.unregister(self.subscription);

        if let Ok(mut core) = self.core.try_borrow_mut() {
            core.pending = None;
            core.status = PlayerStatus::Destroyed;
            log::debug!("{}: destroyed after {} draws", core.label, core.draws);
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive.get()
    }

    pub fn status(&self) -> PlayerStatus {
        if !self.is_alive() {
            return PlayerStatus::Destroyed;
        }
        self.core.borrow().status.clone()
    }

    /// Frame the next draw will show, once playing
    pub fn current_frame(&self) -> Option<u32> {
        self.core.borrow().playback.map(|state| state.current_frame)
    }

    pub fn draw_count(&self) -> u64 {
        self.core.borrow().draws
    }

    pub fn geometry(&self) -> SheetGeometry {
        self.core.borrow().geometry
    }

    pub fn label(&self) -> String {
        self.core.borrow().label.clone()
    }

    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.core.borrow().surface)
    }
}

impl<S: Surface + 'static, H: RefreshHost> Drop for PlayerHandle<S, H> {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn check_surface<S: Surface>(surface: &S) -> Result<(), ConfigError> {
    let (width, height) = surface.size();
    if width == 0 || height == 0 {
        return Err(ConfigError::EmptySurface { width, height });
    }
    Ok(())
}
