use std::fmt;

use crate::{
    Wheel,
    clock::Timestamp,
    slot::{Linked, Links},
};

/// Callback invoked when a timer fires.
///
/// Receives the wheel that owns the timer, so it may schedule, cancel or
/// clear timers on it, and the user data the timer was scheduled with.
pub type Callback<D, C> = Box<dyn FnMut(&mut Wheel<D, C>, &mut D)>;

/// How a timer behaves after it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Fire once, then release.
    OneShot,
    /// Fire every `delay` seconds until cancelled.
    Periodic,
}

/// Identity of a scheduled timer. Never reused by the wheel that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(u64);

impl EntryId {
    pub(crate) const FIRST: Self = Self(1);

    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    #[inline]
    pub(crate) const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle for cancelling or inspecting a scheduled timer.
///
/// Handles are `Copy`: cancelling twice, or cancelling a timer that already
/// fired, is a harmless no-op because the embedded [`EntryId`] is checked
/// against the live entry. A periodic timer keeps its handle across re-arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryHandle {
    pub(crate) key: usize,
    pub(crate) id: EntryId,
}

impl EntryHandle {
    #[inline]
    pub fn id(&self) -> EntryId {
        self.id
    }
}

/// Snapshot of a live timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryInfo {
    pub id: EntryId,
    /// When the timer was first armed; preserved across periodic re-arms.
    pub started: Timestamp,
    pub expires_at: Timestamp,
    pub delay: u32,
    pub mode: Mode,
    /// Index of the slot currently holding the timer.
    pub slot: usize,
}

/// Callback and user data, checked out while the callback runs.
pub(crate) struct Armed<D, C> {
    pub callback: Callback<D, C>,
    pub data: D,
}

pub(crate) struct Entry<D, C> {
    pub id: EntryId,
    pub started: Timestamp,
    pub expires_at: Timestamp,
    pub delay: u32,
    pub mode: Mode,
    pub slot: usize,
    pub armed: Option<Armed<D, C>>,
    links: Links,
}

impl<D, C> Entry<D, C> {
    pub fn new(
        id: EntryId,
        now: Timestamp,
        delay: u32,
        mode: Mode,
        slot: usize,
        armed: Armed<D, C>,
    ) -> Self {
        Self {
            id,
            started: now,
            expires_at: now.saturating_add(delay as u64),
            delay,
            mode,
            slot,
            armed: Some(armed),
            links: Links::default(),
        }
    }

    /// Late, exactly due, or inside the early-fire band of one slot width.
    #[inline]
    pub fn is_due(&self, now: Timestamp, slot_width: u64) -> bool {
        now >= self.expires_at || self.expires_at.abs_diff(now) < slot_width
    }

    /// The callback is checked out, i.e. the entry is firing right now.
    #[inline]
    pub fn is_malformed(&self) -> bool {
        self.armed.is_none()
    }

    pub fn info(&self) -> EntryInfo {
        EntryInfo {
            id: self.id,
            started: self.started,
            expires_at: self.expires_at,
            delay: self.delay,
            mode: self.mode,
            slot: self.slot,
        }
    }
}

impl<D, C> Linked for Entry<D, C> {
    #[inline]
    fn links(&self) -> &Links {
        &self.links
    }

    #[inline]
    fn links_mut(&mut self) -> &mut Links {
        &mut self.links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn entry(now: Timestamp, delay: u32) -> Entry<(), ManualClock> {
        Entry::new(
            EntryId::FIRST,
            now,
            delay,
            Mode::OneShot,
            0,
            Armed {
                callback: Box::new(|_: &mut Wheel<(), ManualClock>, _: &mut ()| {}),
                data: (),
            },
        )
    }

    #[test]
    fn test_expiry_is_start_plus_delay() {
        let e = entry(1_000, 7);
        assert_eq!(e.started, 1_000);
        assert_eq!(e.expires_at, 1_007);
        assert!(!e.is_malformed());
    }

    #[test]
    fn test_due_when_late_or_exact() {
        let e = entry(1_000, 7);
        assert!(e.is_due(1_007, 1));
        assert!(e.is_due(1_500, 1));
        assert!(!e.is_due(1_006, 1));
    }

    #[test]
    fn test_early_fire_band() {
        let e = entry(1_000, 10);
        // width 5: fires from expires_at - 4 on
        assert!(!e.is_due(1_005, 5));
        assert!(e.is_due(1_006, 5));
        assert!(e.is_due(1_009, 5));
    }

    #[test]
    fn test_checked_out_entry_is_malformed() {
        let mut e = entry(1_000, 1);
        let armed = e.armed.take();
        assert!(armed.is_some());
        assert!(e.is_malformed());
    }

    #[test]
    fn test_ids_are_monotonic() {
        let a = EntryId::FIRST;
        let b = a.next();
        assert!(b > a);
        assert_eq!(b.get(), 2);
        assert_eq!(b.to_string(), "#2");
    }
}
