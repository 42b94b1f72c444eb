use crate::animation::Millis;
use crate::scheduling::RefreshScheduler;
use anyhow::Result;

/// Drives a scheduler at a fixed refresh rate for headless rendering
pub struct FixedRateDriver {
    refresh_hz: u32,
    interval_ms: Millis,
    start_ms: Millis,
    ticks_done: u64,
}

impl FixedRateDriver {
    pub fn new(refresh_hz: u32, start_ms: Millis) -> Self {
        let refresh_hz = refresh_hz.max(1);
        Self {
            refresh_hz,
            interval_ms: 1000.0 / refresh_hz as Millis,
            start_ms,
            ticks_done: 0,
        }
    }

    pub fn interval_ms(&self) -> Millis {
        self.interval_ms
    }

    /// Number of refreshes that cover `duration_ms`, counting the one at time zero
    pub fn ticks_for(&self, duration_ms: u32) -> u64 {
        duration_ms as u64 * self.refresh_hz as u64 / 1000 + 1
    }

    /// Timestamp of refresh number `index`
    pub fn timestamp(&self, index: u64) -> Millis {
        // Multiply rather than accumulate so long runs do not drift
        self.start_ms + index as Millis * self.interval_ms
    }

    /// Deliver `ticks` more refreshes, calling `observe` after each with its
    /// index and timestamp. Stops at the first observer error.
    pub fn run<F>(&mut self, scheduler: &RefreshScheduler, ticks: u64, mut observe: F) -> Result<()>
    where
        F: FnMut(u64, Millis) -> Result<()>,
    {
        for _ in 0..ticks {
            let index = self.ticks_done;
            let now = self.timestamp(index);
            scheduler.tick(now);
            self.ticks_done += 1;
            observe(index, now)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::RefreshHost;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_fixed_rate_timestamps() {
        let scheduler = RefreshScheduler::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        scheduler.register(Box::new(move |now| sink.borrow_mut().push(now)));

        let mut driver = FixedRateDriver::new(50, 100.0);
        driver.run(&scheduler, 3, |_, _| Ok(())).unwrap();
        driver.run(&scheduler, 1, |_, _| Ok(())).unwrap();

        assert_eq!(*seen.borrow(), vec![100.0, 120.0, 140.0, 160.0]);
    }

    #[test]
    fn test_ticks_for_duration() {
        let driver = FixedRateDriver::new(60, 0.0);
        assert_eq!(driver.ticks_for(0), 1);
        assert_eq!(driver.ticks_for(1000), 61);
    }

    #[test]
    fn test_observer_error_stops_run() {
        let scheduler = RefreshScheduler::new();
        let mut driver = FixedRateDriver::new(60, 0.0);

        let result = driver.run(&scheduler, 10, |index, _| {
            if index == 2 {
                anyhow::bail!("sink closed");
            }
            Ok(())
        });

        assert!(result.is_err());
        assert_eq!(scheduler.tick_count(), 3);
    }
}
