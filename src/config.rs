use std::num::NonZeroUsize;

use crate::error::ConfigError;

/// Seconds covered by one revolution of the wheel.
pub const CYCLE_SECS: u64 = 60;

/// Slot count used when none (or zero) is requested.
pub const DEFAULT_SLOTS: usize = 60;

/// What the tick processor does when it meets an entry it cannot fire.
///
/// An entry is malformed while its callback is checked out, which happens
/// when `tick` is re-entered from inside that entry's own callback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScanPolicy {
    /// Leave the entry alone and keep scanning the slot.
    #[default]
    SkipMalformed,
    /// Abandon the rest of the slot for this tick.
    StopAtMalformed,
}

/// Wheel construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelConfig {
    /// Number of slots; `0` selects [`DEFAULT_SLOTS`].
    pub slots: usize,
    /// Upper bound on live entries. `None` grows on demand.
    pub capacity: Option<NonZeroUsize>,
    pub scan: ScanPolicy,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            slots: DEFAULT_SLOTS,
            capacity: None,
            scan: ScanPolicy::default(),
        }
    }
}

impl WheelConfig {
    pub fn with_slots(mut self, slots: usize) -> Self {
        self.slots = slots;
        self
    }

    pub fn with_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_scan(mut self, scan: ScanPolicy) -> Self {
        self.scan = scan;
        self
    }

    /// Resolved `(slot_count, slot_width)` pair.
    pub(crate) fn geometry(&self) -> Result<(usize, u64), ConfigError> {
        let slots = if self.slots == 0 {
            DEFAULT_SLOTS
        } else {
            self.slots
        };

        let width = CYCLE_SECS / slots as u64;
        if width == 0 {
            return Err(ConfigError::SlotWidthTruncated { slots });
        }

        Ok((slots, width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        assert_eq!(WheelConfig::default().geometry(), Ok((60, 1)));
    }

    #[test]
    fn test_zero_slots_means_default() {
        let cfg = WheelConfig::default().with_slots(0);
        assert_eq!(cfg.geometry(), Ok((60, 1)));
    }

    #[test]
    fn test_width_is_integer_division() {
        assert_eq!(WheelConfig::default().with_slots(1).geometry(), Ok((1, 60)));
        assert_eq!(WheelConfig::default().with_slots(12).geometry(), Ok((12, 5)));
        assert_eq!(WheelConfig::default().with_slots(7).geometry(), Ok((7, 8)));
        assert_eq!(WheelConfig::default().with_slots(31).geometry(), Ok((31, 1)));
    }

    #[test]
    fn test_too_many_slots_rejected() {
        assert_eq!(
            WheelConfig::default().with_slots(61).geometry(),
            Err(ConfigError::SlotWidthTruncated { slots: 61 })
        );
    }

    #[test]
    fn test_builder_setters() {
        let cap = NonZeroUsize::new(8).unwrap();
        let cfg = WheelConfig::default()
            .with_slots(30)
            .with_capacity(cap)
            .with_scan(ScanPolicy::StopAtMalformed);

        assert_eq!(cfg.slots, 30);
        assert_eq!(cfg.capacity, Some(cap));
        assert_eq!(cfg.scan, ScanPolicy::StopAtMalformed);
    }
}
