use crate::data::SheetGeometry;

/// Refresh timestamp in milliseconds from a monotonic clock
pub type Millis = f64;

/// Per-player animation cursor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub current_frame: u32,
    pub last_advance_ms: Millis,
}

/// Result of offering one refresh tick to a cursor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub state: PlaybackState,
    /// Frame to draw on this tick, if the delay has elapsed
    pub draw: Option<u32>,
}

impl PlaybackState {
    /// Cursor at the first frame of the loop, with `now` as the playback epoch
    pub fn start(geometry: &SheetGeometry, now: Millis) -> Self {
        Self {
            current_frame: geometry.start_frame(),
            last_advance_ms: now,
        }
    }

    /// Frame that follows the current one; end wraps to start
    pub fn next_frame(&self, geometry: &SheetGeometry) -> u32 {
        if self.current_frame >= geometry.end_frame() {
            geometry.start_frame()
        } else {
            self.current_frame + 1
        }
    }

    /// Offer a refresh tick at `now`.
    ///
    /// Only elapsed time matters, never how many ticks arrived, so the cadence
    /// is the same at 60 Hz and 120 Hz. When at least `frame_delay_ms` has
    /// passed since the last advance the current frame is due for drawing and
    /// the cursor moves on, taking `now` as its new baseline. Otherwise the
    /// state is returned unchanged. Non-finite timestamps are never due.
    pub fn advance(self, geometry: &SheetGeometry, frame_delay_ms: u32, now: Millis) -> Step {
        let elapsed = now - self.last_advance_ms;
        let due = now.is_finite() && elapsed >= frame_delay_ms as Millis;
        if !due {
            return Step {
                state: self,
                draw: None,
            };
        }

        Step {
            state: PlaybackState {
                current_frame: self.next_frame(geometry),
                last_advance_ms: now,
            },
            draw: Some(self.current_frame),
        }
    }
}

/// Frame the cursor shows after `advances` steps from the start of the loop
pub fn frame_after(geometry: &SheetGeometry, advances: u64) -> u32 {
    let offset = advances % geometry.loop_len();
    geometry.start_frame() + offset as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_ticks(geometry: &SheetGeometry, delay: u32, ticks: &[Millis]) -> (PlaybackState, Vec<(Millis, u32)>) {
        let mut state = PlaybackState::start(geometry, 0.0);
        let mut draws = Vec::new();
        for &now in ticks {
            let step = state.advance(geometry, delay, now);
            if let Some(frame) = step.draw {
                draws.push((now, frame));
            }
            state = step.state;
        }
        (state, draws)
    }

    #[test]
    fn test_advances_only_after_delay() {
        let geometry = SheetGeometry::default();

        // 0 and 30 are too early, 95 advances, 110 is 15ms after 95, 200 is 105ms after 95
        let (state, draws) = run_ticks(&geometry, 90, &[0.0, 30.0, 95.0, 110.0, 200.0]);

        assert_eq!(draws, vec![(95.0, 0), (200.0, 1)]);
        assert_eq!(state.current_frame, 2);
        assert_eq!(state.last_advance_ms, 200.0);
    }

    #[test]
    fn test_exact_delay_advances() {
        let geometry = SheetGeometry::default();
        let state = PlaybackState::start(&geometry, 10.0);

        let step = state.advance(&geometry, 90, 100.0);
        assert_eq!(step.draw, Some(0));
        assert_eq!(step.state.current_frame, 1);
    }

    #[test]
    fn test_early_tick_leaves_state_unchanged() {
        let geometry = SheetGeometry::default();
        let state = PlaybackState::start(&geometry, 50.0);

        let step = state.advance(&geometry, 90, 139.9);
        assert_eq!(step.draw, None);
        assert_eq!(step.state, state);
    }

    #[test]
    fn test_non_finite_tick_is_ignored() {
        let geometry = SheetGeometry::default();
        let state = PlaybackState::start(&geometry, 0.0);

        for now in [Millis::NAN, Millis::INFINITY, Millis::NEG_INFINITY] {
            let step = state.advance(&geometry, 90, now);
            assert_eq!(step.draw, None);
            assert_eq!(step.state, state);
        }

        // The baseline survives, so the next real tick keeps the cadence
        let (state, draws) = run_ticks(&geometry, 90, &[Millis::NAN, 50.0, Millis::NAN, 90.0, 120.0]);
        assert_eq!(draws, vec![(90.0, 0)]);
        assert_eq!(state.last_advance_ms, 90.0);
    }

    #[test]
    fn test_cursor_follows_modular_formula() {
        let geometry = SheetGeometry::new(16, 16, 4, 3, 9).unwrap();
        let mut state = PlaybackState::start(&geometry, 0.0);

        for k in 1..=50u64 {
            state = state.advance(&geometry, 100, k as Millis * 100.0).state;
            assert_eq!(state.current_frame, frame_after(&geometry, k));
            assert_eq!(state.current_frame, 3 + (k % 7) as u32);
            assert!(geometry.contains(state.current_frame));
        }
    }

    #[test]
    fn test_full_loops_return_to_start() {
        let geometry = SheetGeometry::default();
        let mut state = PlaybackState::start(&geometry, 0.0);
        let loop_len = geometry.loop_len();

        for n in 1..=3u64 {
            for k in 0..loop_len {
                let now = ((n - 1) * loop_len + k + 1) as Millis * 90.0;
                state = state.advance(&geometry, 90, now).state;
            }
            assert_eq!(state.current_frame, geometry.start_frame());
        }
    }

    #[test]
    fn test_single_frame_loop_redraws_same_frame() {
        let geometry = SheetGeometry::new(8, 8, 2, 1, 1).unwrap();
        let (state, draws) = run_ticks(&geometry, 10, &[10.0, 20.0, 25.0, 30.0]);

        assert_eq!(draws, vec![(10.0, 1), (20.0, 1), (30.0, 1)]);
        assert_eq!(state.current_frame, 1);
    }

    #[test]
    fn test_high_refresh_rate_keeps_cadence() {
        let geometry = SheetGeometry::default();
        let ticks_60: Vec<Millis> = (0..=60).map(|i| i as Millis * 1000.0 / 60.0).collect();
        let ticks_120: Vec<Millis> = (0..=120).map(|i| i as Millis * 1000.0 / 120.0).collect();

        let (_, draws_60) = run_ticks(&geometry, 90, &ticks_60);
        let (_, draws_120) = run_ticks(&geometry, 90, &ticks_120);

        // Both stay near 1000 / 90 advances per second
        assert!((9..=11).contains(&draws_60.len()), "60Hz: {}", draws_60.len());
        assert!((10..=11).contains(&draws_120.len()), "120Hz: {}", draws_120.len());
    }
}
