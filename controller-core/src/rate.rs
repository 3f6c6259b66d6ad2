//! Tick rate validation and parsing.
//!
//! The rate is written as free-form text by an operator. Parsing behaves like
//! a `%u` scan: leading whitespace and one optional `+` are skipped, the
//! leading unsigned decimal is read and any trailing bytes (such as a newline)
//! are ignored. Anything that does not produce a value in `1..=9` is dropped
//! without an error.

use core::fmt;
use core::time::Duration;

use winnow::ascii::{dec_uint, multispace0};
use winnow::combinator::{opt, preceded};
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;

/// Tick rate in ticks per second, always within `1..=9`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Rate(u8);

impl Rate {
    /// Slowest accepted rate.
    pub const MIN_HZ: u8 = 1;
    /// Fastest accepted rate.
    pub const MAX_HZ: u8 = 9;
    /// Rate the controller starts with.
    pub const DEFAULT: Self = Self(1);

    /// Validates a raw rate.
    #[must_use]
    pub const fn new(hz: u8) -> Option<Self> {
        if hz >= Self::MIN_HZ && hz <= Self::MAX_HZ {
            Some(Self(hz))
        } else {
            None
        }
    }

    /// Ticks per second.
    #[must_use]
    pub const fn hz(self) -> u8 {
        self.0
    }

    /// Interval between two ticks at this rate.
    #[must_use]
    pub fn period(self) -> Duration {
        Duration::from_secs(1) / u32::from(self.0)
    }

    /// Parses operator input; returns `None` for anything that is not a valid rate.
    #[must_use]
    pub fn parse(input: &[u8]) -> Option<Self> {
        let mut cursor = input;
        let value = leading_uint(&mut cursor).ok()?;
        let hz = u8::try_from(value).ok()?;
        Self::new(hz)
    }

    /// Convenience wrapper over [`Rate::parse`] for text input.
    #[must_use]
    pub fn parse_str(input: &str) -> Option<Self> {
        Self::parse(input.as_bytes())
    }
}

impl Default for Rate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

fn leading_uint(input: &mut &[u8]) -> Result<u32, ErrMode<ContextError>> {
    preceded((multispace0, opt(b'+')), dec_uint).parse_next(input)
}
