//! Operator console shared between firmware and emulator targets.
//!
//! Bytes arrive one at a time from whatever transport carries the console.
//! [`LineAssembler`] collects them into bounded lines, [`grammar`] parses a
//! line into a [`ConsoleCommand`] and [`commands::CommandExecutor`] runs it
//! against a [`SignalControl`].

pub mod commands;
pub mod grammar;

use core::str;

use heapless::Vec;

pub use commands::{
    CommandError, CommandExecutor, CommandOutcome, ControlError, HELP_TOPICS, SignalControl,
};
pub use grammar::{ConsoleCommand, ConsoleError};

/// Maximum number of bytes accepted on a single console line (excluding terminator).
pub const MAX_LINE_LEN: usize = 64;

/// Result of feeding one byte to a [`LineAssembler`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineEvent<'a> {
    /// More bytes are needed.
    Pending,
    /// A terminator completed a non-empty line.
    Line(&'a str),
}

/// Collects console bytes into lines.
pub struct LineAssembler {
    buffer: Vec<u8, MAX_LINE_LEN>,
    complete: bool,
    discarding: bool,
}

impl LineAssembler {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            complete: false,
            discarding: false,
        }
    }

    /// Drops any partially assembled line.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.complete = false;
        self.discarding = false;
    }

    /// Feeds a single byte. A newline or carriage return completes the line.
    ///
    /// After an overflow the rest of the line is discarded up to its
    /// terminator so the tail is never parsed as a command of its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::LineOverflow`] on the byte that overflows the
    /// buffer and [`ConsoleError::InvalidUtf8`] when a completed line is not
    /// UTF-8.
    pub fn ingest(&mut self, byte: u8) -> Result<LineEvent<'_>, ConsoleError> {
        if self.complete {
            self.buffer.clear();
            self.complete = false;
        }

        match byte {
            b'\r' | b'\n' => {
                if core::mem::take(&mut self.discarding) || self.buffer.is_empty() {
                    self.buffer.clear();
                    return Ok(LineEvent::Pending);
                }
                self.complete = true;
                let line =
                    str::from_utf8(self.buffer.as_slice()).map_err(|_| ConsoleError::InvalidUtf8)?;
                Ok(LineEvent::Line(line))
            }
            0x08 | 0x7f => {
                self.buffer.pop();
                Ok(LineEvent::Pending)
            }
            _ if self.discarding => Ok(LineEvent::Pending),
            value => {
                if self.buffer.push(value).is_err() {
                    self.buffer.clear();
                    self.discarding = true;
                    return Err(ConsoleError::LineOverflow);
                }
                Ok(LineEvent::Pending)
            }
        }
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}
