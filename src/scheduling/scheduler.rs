//! Host refresh-callback primitive.
//!
//! Stands in for a display's per-frame callback: subscribers register once and
//! then receive a timestamp on every refresh until they unregister.

use crate::animation::Millis;
use slotmap::{new_key_type, SlotMap};
use std::cell::RefCell;
use std::rc::Rc;

new_key_type! {
    /// Handle to a registered refresh callback
    pub struct SubscriptionId;
}

pub type TickCallback = Box<dyn FnMut(Millis)>;

/// Register/unregister interface a player needs from its host
pub trait RefreshHost {
    fn register(&self, callback: TickCallback) -> SubscriptionId;

    /// Returns false if `id` was not registered
    fn unregister(&self, id: SubscriptionId) -> bool;
}

type SharedCallback = Rc<RefCell<TickCallback>>;

struct SchedulerInner {
    callbacks: SlotMap<SubscriptionId, SharedCallback>,
    ticks: u64,
    last_tick: Option<Millis>,
}

/// Single-threaded refresh scheduler. Cloning gives another handle to the same
/// subscriber set.
#[derive(Clone)]
pub struct RefreshScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                callbacks: SlotMap::with_key(),
                ticks: 0,
                last_tick: None,
            })),
        }
    }

    /// Deliver one refresh at `now` to every subscriber registered when the
    /// tick began. A subscriber removed by an earlier callback in the same tick
    /// is still called; it must check its own liveness.
    ///
    /// Returns the number of callbacks dispatched.
    pub fn tick(&self, now: Millis) -> usize {
        let snapshot: Vec<SharedCallback> = {
            let mut inner = self.inner.borrow_mut();
            inner.ticks += 1;
            inner.last_tick = Some(now);
            inner.callbacks.values().cloned().collect()
        };

        let mut dispatched = 0;
        for callback in &snapshot {
            // A callback that ticks the scheduler re-entrantly skips itself
            if let Ok(mut callback) = callback.try_borrow_mut() {
                (*callback)(now);
                dispatched += 1;
            }
        }

        dispatched
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().callbacks.len()
    }

    pub fn tick_count(&self) -> u64 {
        self.inner.borrow().ticks
    }

    pub fn last_tick(&self) -> Option<Millis> {
        self.inner.borrow().last_tick
    }
}

impl Default for RefreshScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RefreshHost for RefreshScheduler {
    fn register(&self, callback: TickCallback) -> SubscriptionId {
        let id = self
            .inner
            .borrow_mut()
            .callbacks
            .insert(Rc::new(RefCell::new(callback)));
        log::debug!("Registered refresh callback {:?}", id);
        id
    }

    fn unregister(&self, id: SubscriptionId) -> bool {
        let removed = self.inner.borrow_mut().callbacks.remove(id).is_some();
        if removed {
            log::debug!("Unregistered refresh callback {:?}", id);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_ticks_reach_subscribers() {
        let scheduler = RefreshScheduler::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&seen);
        scheduler.register(Box::new(move |now| sink.borrow_mut().push(now)));

        assert_eq!(scheduler.tick(16.0), 1);
        assert_eq!(scheduler.tick(32.0), 1);
        assert_eq!(*seen.borrow(), vec![16.0, 32.0]);
        assert_eq!(scheduler.tick_count(), 2);
        assert_eq!(scheduler.last_tick(), Some(32.0));
    }

    #[test]
    fn test_unregister_stops_ticks() {
        let scheduler = RefreshScheduler::new();
        let count = Rc::new(Cell::new(0));

        let counter = Rc::clone(&count);
        let id = scheduler.register(Box::new(move |_| counter.set(counter.get() + 1)));

        scheduler.tick(0.0);
        assert!(scheduler.unregister(id));
        assert!(!scheduler.unregister(id));
        scheduler.tick(16.0);

        assert_eq!(count.get(), 1);
        assert_eq!(scheduler.subscriber_count(), 0);
    }

    #[test]
    fn test_unregister_mid_tick_still_dispatches_snapshot() {
        let scheduler = RefreshScheduler::new();
        let victim_calls = Rc::new(Cell::new(0));
        let victim_id: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));

        // First subscriber removes the second during the same tick
        let host = scheduler.clone();
        let target = Rc::clone(&victim_id);
        scheduler.register(Box::new(move |_| {
            if let Some(id) = target.take() {
                host.unregister(id);
            }
        }));

        let calls = Rc::clone(&victim_calls);
        let id = scheduler.register(Box::new(move |_| calls.set(calls.get() + 1)));
        victim_id.set(Some(id));

        assert_eq!(scheduler.tick(0.0), 2);
        assert_eq!(victim_calls.get(), 1);
        assert_eq!(scheduler.tick(16.0), 1);
        assert_eq!(victim_calls.get(), 1);
    }
}
