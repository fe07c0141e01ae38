//! Coarse-grained, tick-driven timing wheel.
//!
//! Schedule one-shot or periodic callbacks with a delay in whole seconds, then
//! call [`Wheel::tick`] on a fixed cadence; due callbacks run synchronously
//! from inside the tick.
//!
//! ```
//! use tickwheel::{ManualClock, Mode, Wheel};
//!
//! let clock = ManualClock::new(1_000);
//! let mut wheel: Wheel<&str, _> = Wheel::with_clock(60, clock.clone()).unwrap();
//!
//! let handle = wheel
//!     .schedule(2, Mode::OneShot, |_, name| println!("hello {name}"), "wheel")
//!     .unwrap();
//!
//! clock.advance(2);
//! assert_eq!(wheel.tick(), 1);
//! assert!(!wheel.contains(handle));
//! ```

mod clock;
mod config;
mod entry;
mod error;
mod slab;
mod slot;
mod trace;
mod wheel;

pub use clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use config::{CYCLE_SECS, DEFAULT_SLOTS, ScanPolicy, WheelConfig};
pub use entry::{Callback, EntryHandle, EntryId, EntryInfo, Mode};
pub use error::{ConfigError, ScheduleError};
pub use trace::init_tracing;
pub use wheel::{Wheel, slot_index};
