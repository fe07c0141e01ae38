use std::{
    fmt,
    num::NonZeroUsize,
    panic::{self, AssertUnwindSafe},
};

use crate::{
    clock::{Clock, SystemClock, Timestamp},
    config::{CYCLE_SECS, ScanPolicy, WheelConfig},
    entry::{Armed, Entry, EntryHandle, EntryId, EntryInfo, Mode},
    error::{ConfigError, ScheduleError},
    slab::Slab,
    slot::Slot,
    trace::{debug, trace, warn},
};

/// Map an absolute expiry `now + delay` to a slot index in `[0, slots)`.
///
/// Expiries at the same phase of the wheel's cycle land in the same slot no
/// matter how many cycles have passed since `origin`. The phase is
/// `origin - (now + delay)`, which is normally negative, so both the
/// division and the modulo are floored rather than truncated.
#[inline]
pub fn slot_index(
    origin: Timestamp,
    now: Timestamp,
    delay: u64,
    slot_width: u64,
    slots: usize,
) -> usize {
    debug_assert!(slot_width > 0, "slot width must be non-zero");
    debug_assert!(slots > 0, "wheel must have at least one slot");

    let phase = origin as i128 - (now as i128 + delay as i128);
    let raw = phase.div_euclid(slot_width as i128);
    raw.rem_euclid(slots as i128) as usize
}

/// Hashed timing wheel covering a fixed cycle of [`CYCLE_SECS`] seconds.
///
/// Timers are scheduled with a delay in whole seconds and fired from
/// [`tick`](Self::tick), which the caller drives at a cadence of its choosing
/// (a few times per slot width is typical). Each tick scans exactly one slot:
/// the one matching the current time. A timer fires when it is late, exactly
/// due, or less than one slot width early.
///
/// Memory is bounded by the number of live timers; delays longer than the
/// cycle simply wait in their slot for the right revolution.
pub struct Wheel<D, C = SystemClock> {
    slots: Box<[Slot]>,
    entries: Slab<Entry<D, C>>,
    slot_width: u64,
    origin: Timestamp,
    next_id: EntryId,
    capacity: Option<NonZeroUsize>,
    scan: ScanPolicy,
    clock: C,
    // Reused between ticks; holds the keys of the slot being scanned.
    batch: Vec<(usize, EntryId)>,
}

impl<D> Wheel<D, SystemClock> {
    /// Wheel on the system clock. `slots == 0` selects the default of 60.
    pub fn new(slots: usize) -> Result<Self, ConfigError> {
        Self::with_clock(slots, SystemClock)
    }
}

impl<D, C: Clock> Wheel<D, C> {
    pub fn with_clock(slots: usize, clock: C) -> Result<Self, ConfigError> {
        Self::with_config(WheelConfig::default().with_slots(slots), clock)
    }

    pub fn with_config(config: WheelConfig, clock: C) -> Result<Self, ConfigError> {
        let (slot_count, slot_width) = config.geometry()?;

        if CYCLE_SECS % slot_count as u64 != 0 {
            warn!(
                slots = slot_count,
                slot_width,
                cycle = slot_count as u64 * slot_width,
                "slot count does not divide the cycle evenly"
            );
        }

        let origin = clock.now();
        debug!(slots = slot_count, slot_width, origin, "wheel created");

        Ok(Self {
            slots: (0..slot_count).map(|_| Slot::new()).collect(),
            entries: Slab::new(),
            slot_width,
            origin,
            next_id: EntryId::FIRST,
            capacity: config.capacity,
            scan: config.scan,
            clock,
            batch: Vec::new(),
        })
    }

    /// Schedule `callback` to run `delay` seconds from now.
    ///
    /// Periodic timers re-arm themselves every `delay` seconds and therefore
    /// need a delay of at least one slot width.
    pub fn schedule<F>(
        &mut self,
        delay: u32,
        mode: Mode,
        callback: F,
        data: D,
    ) -> Result<EntryHandle, ScheduleError>
    where
        F: FnMut(&mut Wheel<D, C>, &mut D) + 'static,
    {
        if mode == Mode::Periodic && (delay as u64) < self.slot_width {
            return Err(ScheduleError::PeriodBelowSlotWidth {
                delay,
                slot_width: self.slot_width,
            });
        }
        if let Some(capacity) = self.capacity {
            if self.entries.len() >= capacity.get() {
                return Err(ScheduleError::CapacityExceeded { capacity });
            }
        }

        let now = self.clock.now();
        let slot = self.slot_for(now, delay as u64);
        let id = self.next_id;

        let armed = Armed {
            callback: Box::new(callback),
            data,
        };
        let key = self
            .entries
            .insert(Entry::new(id, now, delay, mode, slot, armed))
            .map_err(|_| ScheduleError::AllocationFailed)?;
        self.slots[slot].push_front(&mut self.entries, key);
        self.next_id = id.next();

        trace!(%id, delay, ?mode, slot, "scheduled");
        Ok(EntryHandle { key, id })
    }

    /// Cancel a timer, handing back its user data.
    ///
    /// Returns `None` if the timer already fired (one-shot), was already
    /// cancelled, or is cancelling itself from inside its own callback; in
    /// the last case the data is dropped once the callback returns.
    pub fn cancel(&mut self, handle: EntryHandle) -> Option<D> {
        let entry = self.entries.get(handle.key)?;
        if entry.id != handle.id {
            return None;
        }

        let slot = entry.slot;
        self.slots[slot].unlink(&mut self.entries, handle.key);
        let entry = self.entries.remove(handle.key)?;

        trace!(id = %handle.id, slot, "cancelled");
        entry.armed.map(|armed| armed.data)
    }

    /// Release every timer. The wheel stays usable. Returns how many were released.
    pub fn cancel_all(&mut self) -> usize {
        let released = self.entries.len();
        for slot in self.slots.iter_mut() {
            slot.clear();
        }
        self.entries.clear();

        debug!(released, "all timers cancelled");
        released
    }

    /// Release the wheel and every timer in it. Returns how many timers were live.
    pub fn destroy(self) -> usize {
        let released = self.entries.len();
        debug!(released, "wheel destroyed");
        released
    }

    /// Scan the slot matching the current time and fire what is due.
    ///
    /// Callbacks run synchronously and may schedule, cancel, clear or even
    /// tick this wheel. Timers they schedule into the slot being scanned are
    /// not visited until a later tick. Returns the number of callbacks run.
    pub fn tick(&mut self) -> usize {
        let now = self.clock.now();
        let index = self.slot_for(now, 0);
        if self.slots[index].is_empty() {
            return 0;
        }

        // Keys are captured up front; each one is re-validated before use
        // because an earlier callback may have cancelled or moved it.
        let mut batch = std::mem::take(&mut self.batch);
        batch.clear();
        batch.extend(
            self.slots[index]
                .iter(&self.entries)
                .map(|(key, entry)| (key, entry.id)),
        );

        let mut fired = 0;
        for &(key, id) in &batch {
            let Some(entry) = self.entries.get(key) else {
                continue;
            };
            if entry.id != id || entry.slot != index {
                continue;
            }

            if entry.is_malformed() {
                warn!(%id, slot = index, policy = ?self.scan, "malformed entry in slot");
                match self.scan {
                    ScanPolicy::SkipMalformed => continue,
                    ScanPolicy::StopAtMalformed => break,
                }
            }

            if !entry.is_due(now, self.slot_width) {
                continue;
            }

            self.fire(key, now);
            fired += 1;
        }

        batch.clear();
        self.batch = batch;
        fired
    }

    fn fire(&mut self, key: usize, now: Timestamp) {
        let Some(entry) = self.entries.get(key) else {
            return;
        };
        let (id, slot, mode) = (entry.id, entry.slot, entry.mode);
        trace!(%id, slot, now, expires_at = entry.expires_at, "firing");

        match mode {
            Mode::OneShot => {
                // Retire before the call so a cancel from inside is a no-op.
                self.slots[slot].unlink(&mut self.entries, key);
                let Some(Armed { mut callback, mut data }) =
                    self.entries.remove(key).and_then(|entry| entry.armed)
                else {
                    return;
                };
                callback(self, &mut data);
            }
            Mode::Periodic => {
                let Some(mut armed) = self
                    .entries
                    .get_mut(key)
                    .and_then(|entry| entry.armed.take())
                else {
                    return;
                };
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    (armed.callback)(self, &mut armed.data)
                }));
                match result {
                    Ok(()) => self.rearm(key, id, now, armed),
                    Err(payload) => {
                        self.retire(key, id);
                        drop(armed);
                        panic::resume_unwind(payload);
                    }
                }
            }
        }
    }

    /// Unlink and release an entry if it is still the one identified by `id`.
    fn retire(&mut self, key: usize, id: EntryId) {
        let Some(entry) = self.entries.get(key) else {
            return;
        };
        if entry.id != id {
            return;
        }

        let slot = entry.slot;
        self.slots[slot].unlink(&mut self.entries, key);
        self.entries.remove(key);
        warn!(%id, slot, "periodic callback panicked, timer released");
    }

    /// Move a fired periodic entry to the slot of its next expiry.
    ///
    /// Identity, `started` and the arena key are kept, so outstanding handles
    /// stay valid.
    fn rearm(&mut self, key: usize, id: EntryId, now: Timestamp, armed: Armed<D, C>) {
        let Some(entry) = self.entries.get(key) else {
            trace!(%id, "cancelled during callback");
            return;
        };
        if entry.id != id {
            trace!(%id, "cancelled during callback");
            return;
        }

        let old_slot = entry.slot;
        let delay = entry.delay as u64;
        let new_slot = self.slot_for(now, delay);

        self.slots[old_slot].unlink(&mut self.entries, key);
        if let Some(entry) = self.entries.get_mut(key) {
            entry.expires_at = now.saturating_add(delay);
            entry.slot = new_slot;
            entry.armed = Some(armed);
        }
        self.slots[new_slot].push_front(&mut self.entries, key);

        trace!(%id, from = old_slot, to = new_slot, "re-armed");
    }

    #[inline]
    fn slot_for(&self, now: Timestamp, delay: u64) -> usize {
        slot_index(self.origin, now, delay, self.slot_width, self.slots.len())
    }

    /// Index of the slot the next tick would scan.
    pub fn current_slot(&self) -> usize {
        self.slot_for(self.clock.now(), 0)
    }

    /// Snapshot of a live timer, or `None` once it fired or was cancelled.
    pub fn entry(&self, handle: EntryHandle) -> Option<EntryInfo> {
        self.entries
            .get(handle.key)
            .filter(|entry| entry.id == handle.id)
            .map(Entry::info)
    }

    pub fn contains(&self, handle: EntryHandle) -> bool {
        self.entry(handle).is_some()
    }

    /// Time the wheel was created. Never changes.
    #[inline]
    pub fn origin_time(&self) -> Timestamp {
        self.origin
    }

    /// Seconds since [`origin_time`](Self::origin_time).
    pub fn elapsed(&self) -> u64 {
        self.clock.now().saturating_sub(self.origin)
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Seconds covered by one slot; also the early-fire tolerance.
    #[inline]
    pub fn slot_width(&self) -> u64 {
        self.slot_width
    }

    /// Number of timers in slot `index`, or `None` if out of range.
    pub fn slot_len(&self, index: usize) -> Option<usize> {
        self.slots.get(index).map(Slot::len)
    }

    /// Number of live timers.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<D, C> fmt::Debug for Wheel<D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wheel")
            .field("slots", &self.slots.len())
            .field("slot_width", &self.slot_width)
            .field("origin", &self.origin)
            .field("len", &self.entries.len())
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}
