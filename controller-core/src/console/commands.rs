//! Console command dispatcher.
//!
//! The executor turns parsed lines into calls on a [`SignalControl`]
//! implementation and renders the reply text. It stays `no_std` friendly so the
//! firmware and emulator share the same replies.

use core::fmt;

use crate::rate::Rate;
use crate::status::{StatusFormatter, StatusSnapshot};

use super::grammar::{self, ConsoleCommand, ConsoleError};

/// Why a [`SignalControl`] refused a command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ControlError {
    /// The command could not be handed to the controller and was dropped.
    Busy,
    /// The controller has shut down and no longer takes commands.
    ShutDown,
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::Busy => f.write_str("controller busy, command dropped"),
            ControlError::ShutDown => f.write_str("controller is shut down"),
        }
    }
}

/// Operations the console may perform on a running controller.
///
/// The emulator applies them directly; the firmware forwards them to the
/// task that owns the controller. A command is only acknowledged to the
/// operator once the implementation returns `Ok`.
pub trait SignalControl {
    fn status(&mut self) -> StatusSnapshot;

    /// Applies an already-validated rate.
    ///
    /// # Errors
    ///
    /// Returns a [`ControlError`] when the rate was not taken.
    fn apply_rate(&mut self, rate: Rate) -> Result<(), ControlError>;

    /// # Errors
    ///
    /// Returns a [`ControlError`] when the toggle was not taken.
    fn toggle(&mut self) -> Result<(), ControlError>;

    /// # Errors
    ///
    /// Returns a [`ControlError`] when the call was not taken.
    fn call(&mut self) -> Result<(), ControlError>;

    /// # Errors
    ///
    /// Returns [`ControlError::Busy`] when the request could not be delivered.
    fn shutdown(&mut self) -> Result<(), ControlError>;
}

impl<T: SignalControl + ?Sized> SignalControl for &mut T {
    fn status(&mut self) -> StatusSnapshot {
        (**self).status()
    }

    fn apply_rate(&mut self, rate: Rate) -> Result<(), ControlError> {
        (**self).apply_rate(rate)
    }

    fn toggle(&mut self) -> Result<(), ControlError> {
        (**self).toggle()
    }

    fn call(&mut self) -> Result<(), ControlError> {
        (**self).call()
    }

    fn shutdown(&mut self) -> Result<(), ControlError> {
        (**self).shutdown()
    }
}

/// One-line summaries shown by `help`.
pub const HELP_TOPICS: [(&str, &str); 6] = [
    ("status", "status            print mode, rate, lights and pedestrian state"),
    ("rate", "rate [1-9] | <n>  show or set the cycle rate in Hz"),
    ("toggle", "toggle            advance normal -> flashing-red -> flashing-yellow"),
    ("call", "call              press the pedestrian call button"),
    ("shutdown", "shutdown          stop the cycle and turn every lamp off"),
    ("help", "help [topic]      list commands or describe one"),
];

/// What an executed command did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommandOutcome {
    Status(StatusSnapshot),
    RateQueried(Rate),
    RateApplied(Rate),
    /// Input was not a rate in `1..=9`; the current rate is kept.
    RateIgnored(Rate),
    Toggled,
    Called,
    ShutDown,
    Help,
}

/// Errors surfaced while executing a console line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CommandError {
    Parse(ConsoleError),
    /// The controller refused the command; nothing changed.
    Control(ControlError),
    /// The reply could not be written.
    Output,
}

impl From<ConsoleError> for CommandError {
    fn from(error: ConsoleError) -> Self {
        Self::Parse(error)
    }
}

impl From<ControlError> for CommandError {
    fn from(error: ControlError) -> Self {
        Self::Control(error)
    }
}

impl From<fmt::Error> for CommandError {
    fn from(_: fmt::Error) -> Self {
        Self::Output
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Parse(error) => error.fmt(f),
            CommandError::Control(error) => error.fmt(f),
            CommandError::Output => f.write_str("reply truncated"),
        }
    }
}

/// Dispatches console lines into a [`SignalControl`].
pub struct CommandExecutor<C> {
    control: C,
}

impl<C> CommandExecutor<C> {
    #[must_use]
    pub const fn new(control: C) -> Self {
        Self { control }
    }

    #[must_use]
    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut C {
        &mut self.control
    }

    #[must_use]
    pub fn into_inner(self) -> C {
        self.control
    }
}

impl<C> CommandExecutor<C>
where
    C: SignalControl,
{
    /// Parses `line`, runs it and writes the reply to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Parse`] for malformed lines,
    /// [`CommandError::Control`] when the controller refuses the command (no
    /// reply is written) and [`CommandError::Output`] when `out` is full.
    pub fn execute<W: fmt::Write>(
        &mut self,
        line: &str,
        out: &mut W,
    ) -> Result<CommandOutcome, CommandError> {
        let command = grammar::parse(line)?;
        self.dispatch(command, out)
    }

    fn dispatch<W: fmt::Write>(
        &mut self,
        command: ConsoleCommand<'_>,
        out: &mut W,
    ) -> Result<CommandOutcome, CommandError> {
        match command {
            ConsoleCommand::Status => {
                let snapshot = self.control.status();
                StatusFormatter::new(&snapshot).write_report(out)?;
                Ok(CommandOutcome::Status(snapshot))
            }
            ConsoleCommand::Rate(None) => {
                let rate = self.control.status().rate;
                writeln!(out, "Cycle Rate: {rate}")?;
                Ok(CommandOutcome::RateQueried(rate))
            }
            ConsoleCommand::Rate(Some(text)) => match Rate::parse_str(text) {
                Some(rate) => {
                    self.control.apply_rate(rate)?;
                    writeln!(out, "rate {rate}")?;
                    Ok(CommandOutcome::RateApplied(rate))
                }
                None => {
                    let current = self.control.status().rate;
                    writeln!(out, "rate unchanged ({current})")?;
                    Ok(CommandOutcome::RateIgnored(current))
                }
            },
            ConsoleCommand::Toggle => {
                self.control.toggle()?;
                writeln!(out, "toggle")?;
                Ok(CommandOutcome::Toggled)
            }
            ConsoleCommand::Call => {
                self.control.call()?;
                writeln!(out, "call")?;
                Ok(CommandOutcome::Called)
            }
            ConsoleCommand::Shutdown => {
                self.control.shutdown()?;
                writeln!(out, "shutdown: lights off")?;
                Ok(CommandOutcome::ShutDown)
            }
            ConsoleCommand::Help(topic) => {
                write_help(topic, out)?;
                Ok(CommandOutcome::Help)
            }
        }
    }
}

fn write_help<W: fmt::Write>(topic: Option<&str>, out: &mut W) -> fmt::Result {
    match topic {
        None => {
            for (_, summary) in HELP_TOPICS {
                writeln!(out, "{summary}")?;
            }
            Ok(())
        }
        Some(topic) => match HELP_TOPICS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(topic))
        {
            Some((_, summary)) => writeln!(out, "{summary}"),
            None => writeln!(out, "no help for `{topic}`"),
        },
    }
}
