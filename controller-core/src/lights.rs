//! Signal head outputs shared by firmware and host targets.
//!
//! The controller only ever reasons about the three-boolean output vector in
//! [`LightState`]. Platforms translate that vector into pin levels through a
//! [`LightDriver`] implementation, so active-high/active-low wiring never
//! leaks into the sequencing logic.

use core::fmt;

/// Identifier for each lamp on the signal head.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LightChannel {
    Red,
    Yellow,
    Green,
}

/// Every channel in the order the outputs are applied.
pub const ALL_CHANNELS: [LightChannel; 3] =
    [LightChannel::Red, LightChannel::Yellow, LightChannel::Green];

impl LightChannel {
    /// Deterministic index for lookups into [`ALL_CHANNELS`].
    #[must_use]
    pub const fn as_index(self) -> usize {
        match self {
            LightChannel::Red => 0,
            LightChannel::Yellow => 1,
            LightChannel::Green => 2,
        }
    }

    /// Attempts to construct a [`LightChannel`] from a raw index.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(LightChannel::Red),
            1 => Some(LightChannel::Yellow),
            2 => Some(LightChannel::Green),
            _ => None,
        }
    }

    /// Lower-case label used by the status surface.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            LightChannel::Red => "red",
            LightChannel::Yellow => "yellow",
            LightChannel::Green => "green",
        }
    }
}

impl fmt::Display for LightChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Last computed on/off vector for the three lamps.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct LightState {
    pub red: bool,
    pub yellow: bool,
    pub green: bool,
}

impl LightState {
    /// All lamps off.
    pub const DARK: Self = Self::new(false, false, false);
    /// Green only.
    pub const GREEN: Self = Self::new(false, false, true);
    /// Yellow only.
    pub const YELLOW: Self = Self::new(false, true, false);
    /// Red only.
    pub const RED: Self = Self::new(true, false, false);
    /// Red and yellow together, shown while pedestrians have right-of-way.
    pub const RED_YELLOW: Self = Self::new(true, true, false);

    #[must_use]
    pub const fn new(red: bool, yellow: bool, green: bool) -> Self {
        Self { red, yellow, green }
    }

    /// Returns the level requested for a single channel.
    #[must_use]
    pub const fn get(self, channel: LightChannel) -> bool {
        match channel {
            LightChannel::Red => self.red,
            LightChannel::Yellow => self.yellow,
            LightChannel::Green => self.green,
        }
    }

    /// Number of lamps currently lit.
    #[must_use]
    pub const fn lit_count(self) -> u8 {
        self.red as u8 + self.yellow as u8 + self.green as u8
    }
}

impl fmt::Display for LightState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for channel in ALL_CHANNELS {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            let level = if self.get(channel) { "on" } else { "off" };
            write!(f, "{channel} {level}")?;
        }
        Ok(())
    }
}

/// Abstraction over the physical lamp outputs.
pub trait LightDriver {
    /// Drives a single lamp; `active` is the logical (lit) level.
    fn set(&mut self, channel: LightChannel, active: bool);

    /// Applies a full output vector, red first.
    fn apply(&mut self, state: LightState) {
        for channel in ALL_CHANNELS {
            self.set(channel, state.get(channel));
        }
    }

    /// Forces every lamp to its inactive level.
    fn darken(&mut self) {
        self.apply(LightState::DARK);
    }
}

impl<T: LightDriver + ?Sized> LightDriver for &mut T {
    fn set(&mut self, channel: LightChannel, active: bool) {
        (**self).set(channel, active);
    }
}

/// Light driver that performs no hardware interaction.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopLightDriver;

impl NoopLightDriver {
    /// Creates a new no-op light driver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LightDriver for NoopLightDriver {
    fn set(&mut self, _: LightChannel, _: bool) {}
}
