use std::num::NonZeroUsize;

use crate::config::CYCLE_SECS;

/// Configuration rejected by the wheel constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// More slots than seconds in the cycle: the slot width would truncate to zero.
    #[error(
        "{slots} slots would truncate the slot width to zero (at most {max} allowed)",
        max = CYCLE_SECS
    )]
    SlotWidthTruncated { slots: usize },
}

/// Reasons a timer could not be scheduled.
///
/// The wheel is left untouched when `schedule` fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    /// A shorter period would be due again on the tick right after each re-arm.
    #[error("periodic timer period of {delay}s is below the {slot_width}s slot width")]
    PeriodBelowSlotWidth { delay: u32, slot_width: u64 },
    #[error("wheel capacity of {capacity} entries exceeded")]
    CapacityExceeded { capacity: NonZeroUsize },
    #[error("failed to allocate storage for a timer entry")]
    AllocationFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ConfigError::SlotWidthTruncated { slots: 61 }.to_string(),
            "61 slots would truncate the slot width to zero (at most 60 allowed)"
        );
        assert_eq!(
            ScheduleError::CapacityExceeded {
                capacity: NonZeroUsize::new(4).unwrap()
            }
            .to_string(),
            "wheel capacity of 4 entries exceeded"
        );
        assert_eq!(
            ScheduleError::PeriodBelowSlotWidth {
                delay: 1,
                slot_width: 5
            }
            .to_string(),
            "periodic timer period of 1s is below the 5s slot width"
        );
    }
}
