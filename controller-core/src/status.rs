//! Status surface shared by every front-end.
//!
//! [`StatusSnapshot`] captures what an operator may read: mode, rate, lamp
//! vector and pedestrian presence. [`StatusFormatter`] renders it as the fixed
//! four-line report:
//!
//! ```text
//! Mode: normal
//! Cycle Rate: 1 Hz
//! Lights: red off, yellow off, green on
//! Pedestrian: not present
//! ```
//!
//! The firmware publishes snapshots across tasks as a packed `u16`, so the
//! packing lives here next to the type.

use core::fmt;

use crate::lights::LightState;
use crate::mode::Mode;
use crate::rate::Rate;

/// Point-in-time view of the controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub mode: Mode,
    pub rate: Rate,
    pub lights: LightState,
    pub pedestrian_present: bool,
}

impl StatusSnapshot {
    const MODE_MASK: u16 = 0b11;
    const RATE_SHIFT: u16 = 2;
    const RATE_MASK: u16 = 0b1111;
    const RED_BIT: u16 = 1 << 6;
    const YELLOW_BIT: u16 = 1 << 7;
    const GREEN_BIT: u16 = 1 << 8;
    const PEDESTRIAN_BIT: u16 = 1 << 9;
    const VALID_BIT: u16 = 1 << 15;

    #[must_use]
    pub const fn new(mode: Mode, rate: Rate, lights: LightState, pedestrian_present: bool) -> Self {
        Self {
            mode,
            rate,
            lights,
            pedestrian_present,
        }
    }

    /// Snapshot of a freshly started controller.
    #[must_use]
    pub const fn initial() -> Self {
        Self::new(Mode::Normal, Rate::DEFAULT, LightState::GREEN, false)
    }

    /// Packs the snapshot into a word suitable for an atomic cell.
    ///
    /// Zero never encodes a valid snapshot.
    #[must_use]
    pub const fn pack(&self) -> u16 {
        let mut word = Self::VALID_BIT
            | (self.mode.to_raw() as u16 & Self::MODE_MASK)
            | ((self.rate.hz() as u16 & Self::RATE_MASK) << Self::RATE_SHIFT);
        if self.lights.red {
            word |= Self::RED_BIT;
        }
        if self.lights.yellow {
            word |= Self::YELLOW_BIT;
        }
        if self.lights.green {
            word |= Self::GREEN_BIT;
        }
        if self.pedestrian_present {
            word |= Self::PEDESTRIAN_BIT;
        }
        word
    }

    /// Decodes a word produced by [`StatusSnapshot::pack`].
    #[must_use]
    pub const fn unpack(word: u16) -> Option<Self> {
        if word & Self::VALID_BIT == 0 {
            return None;
        }
        let Some(mode) = Mode::from_raw((word & Self::MODE_MASK) as u8) else {
            return None;
        };
        let Some(rate) = Rate::new(((word >> Self::RATE_SHIFT) & Self::RATE_MASK) as u8) else {
            return None;
        };
        let lights = LightState::new(
            word & Self::RED_BIT != 0,
            word & Self::YELLOW_BIT != 0,
            word & Self::GREEN_BIT != 0,
        );
        Some(Self::new(mode, rate, lights, word & Self::PEDESTRIAN_BIT != 0))
    }
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}

/// Platform hook that supplies live status information.
pub trait StatusProvider {
    fn status(&self) -> StatusSnapshot;
}

/// Renders a [`StatusSnapshot`] as the operator-facing report.
#[derive(Clone, Copy, Debug)]
pub struct StatusFormatter<'a> {
    snapshot: &'a StatusSnapshot,
}

impl<'a> StatusFormatter<'a> {
    #[must_use]
    pub const fn new(snapshot: &'a StatusSnapshot) -> Self {
        Self { snapshot }
    }

    /// Writes `Mode: <label>`.
    ///
    /// # Errors
    ///
    /// Propagates any error from `writer`.
    pub fn write_mode_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        write!(writer, "Mode: {}", self.snapshot.mode)
    }

    /// Writes `Cycle Rate: <n> Hz`.
    ///
    /// # Errors
    ///
    /// Propagates any error from `writer`.
    pub fn write_rate_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        write!(writer, "Cycle Rate: {}", self.snapshot.rate)
    }

    /// Writes `Lights: red on|off, yellow on|off, green on|off`.
    ///
    /// # Errors
    ///
    /// Propagates any error from `writer`.
    pub fn write_lights_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        write!(writer, "Lights: {}", self.snapshot.lights)
    }

    /// Writes `Pedestrian: present|not present`.
    ///
    /// # Errors
    ///
    /// Propagates any error from `writer`.
    pub fn write_pedestrian_line<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        writer.write_str("Pedestrian: ")?;
        writer.write_str(if self.snapshot.pedestrian_present {
            "present"
        } else {
            "not present"
        })
    }

    /// Writes all four lines, each terminated by `\n`.
    ///
    /// # Errors
    ///
    /// Propagates any error from `writer`; the report may then be partial.
    pub fn write_report<W: fmt::Write>(&self, writer: &mut W) -> fmt::Result {
        self.write_mode_line(writer)?;
        writer.write_char('\n')?;
        self.write_rate_line(writer)?;
        writer.write_char('\n')?;
        self.write_lights_line(writer)?;
        writer.write_char('\n')?;
        self.write_pedestrian_line(writer)?;
        writer.write_char('\n')
    }
}

impl fmt::Display for StatusFormatter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_report(f)
    }
}
