//! Operating modes and the flashing light patterns.
//!
//! The mode advances in a fixed ring on every accepted toggle event. Flashing
//! modes compute their output purely from the parity of the cycle counter, so
//! they need no state of their own.

use core::fmt;

use crate::lights::LightState;

/// Operating mode of the signal head.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Mode {
    #[default]
    Normal,
    FlashingRed,
    FlashingYellow,
}

impl Mode {
    /// Mode entered after a toggle event.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Mode::Normal => Mode::FlashingRed,
            Mode::FlashingRed => Mode::FlashingYellow,
            Mode::FlashingYellow => Mode::Normal,
        }
    }

    /// Name reported by the status surface.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::FlashingRed => "flashing-red",
            Mode::FlashingYellow => "flashing-yellow",
        }
    }

    /// Compact discriminant used when packing status snapshots.
    #[must_use]
    pub const fn to_raw(self) -> u8 {
        match self {
            Mode::Normal => 0,
            Mode::FlashingRed => 1,
            Mode::FlashingYellow => 2,
        }
    }

    /// Decodes [`Mode::to_raw`]; unknown codes yield `None`.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Mode::Normal),
            1 => Some(Mode::FlashingRed),
            2 => Some(Mode::FlashingYellow),
            _ => None,
        }
    }

    /// Returns `true` for the two flashing modes.
    #[must_use]
    pub const fn is_flashing(self) -> bool {
        matches!(self, Mode::FlashingRed | Mode::FlashingYellow)
    }

    /// Output for a flashing mode at the given cycle count, `None` in NORMAL.
    ///
    /// The lamp is lit on odd counts, so the first tick after a toggle (count
    /// 1) always lights it.
    #[must_use]
    pub const fn flashing_output(self, cycle_count: u32) -> Option<LightState> {
        let lit = cycle_count % 2 == 1;
        match self {
            Mode::Normal => None,
            Mode::FlashingRed => Some(LightState::new(lit, false, false)),
            Mode::FlashingYellow => Some(LightState::new(false, lit, false)),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
