//! Shared status storage for the firmware target.
//!
//! The signal task publishes a packed [`StatusSnapshot`] after every complete
//! update; console readers load it with a single atomic read, so they never
//! observe a half-applied tick or event.

use controller_core::status::StatusSnapshot;
use portable_atomic::{AtomicU16, Ordering};

/// Packed snapshot; zero until the signal task publishes its first state.
static STATUS: AtomicU16 = AtomicU16::new(0);

/// Stores the latest controller snapshot.
pub fn publish(snapshot: StatusSnapshot) {
    STATUS.store(snapshot.pack(), Ordering::Release);
}

/// Returns the latest published snapshot, or the start-up state before the
/// first publication.
pub fn current() -> StatusSnapshot {
    StatusSnapshot::unpack(STATUS.load(Ordering::Acquire)).unwrap_or_else(StatusSnapshot::initial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use controller_core::lights::LightState;
    use controller_core::mode::Mode;
    use controller_core::rate::Rate;

    #[test]
    fn publishes_and_reads_back() {
        let snapshot = StatusSnapshot::new(
            Mode::FlashingRed,
            Rate::new(3).unwrap(),
            LightState::RED,
            false,
        );
        publish(snapshot);
        assert_eq!(current(), snapshot);
    }
}
