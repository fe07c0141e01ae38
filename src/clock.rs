use std::{
    cell::Cell,
    rc::Rc,
    time::{SystemTime, UNIX_EPOCH},
};

/// Whole seconds on the clock the wheel was built with.
pub type Timestamp = u64;

/// Source of the current time.
///
/// The wheel reads the clock on every `schedule` and `tick`; it never sleeps
/// or waits on it.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall-clock seconds since the UNIX epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs())
    }
}

/// Manually driven clock.
///
/// Clones share the same reading, so a test can keep one handle and hand
/// another to the wheel.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Timestamp>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    #[inline]
    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }

    #[inline]
    pub fn advance(&self, secs: u64) {
        self.now.set(self.now.get().saturating_add(secs));
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}
