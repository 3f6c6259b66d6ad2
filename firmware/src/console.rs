//! USB console session.
//!
//! Bytes from the CDC interface are assembled into lines and executed with the
//! shared `controller-core` console. Commands that change state are posted to
//! the signal task; `status` reads the last published snapshot, overlaid with
//! any rate or shutdown this session has posted but the task has not applied.

use core::fmt::Write as _;

use controller_core::console::{
    CommandExecutor, ConsoleError, ControlError, LineAssembler, LineEvent, SignalControl,
};
use controller_core::lights::LightState;
use controller_core::rate::Rate;
use controller_core::status::StatusSnapshot;
use heapless::String;

use crate::signal::{self, SignalEvent, SignalSender};
use crate::status;
use crate::telemetry;

/// Largest reply produced by a single command (`help` is the longest).
pub const REPLY_CAPACITY: usize = 512;

pub type Reply = String<REPLY_CAPACITY>;

/// Forwards console commands to the signal task.
///
/// The console is the only writer of the rate and the only source of
/// shutdown, and the queue is FIFO, so the last accepted value of each is
/// what the task will hold once it drains.
pub struct ChannelControl<'a> {
    sender: SignalSender<'a>,
    posted_rate: Option<Rate>,
    shut_down: bool,
}

impl<'a> ChannelControl<'a> {
    pub const fn new(sender: SignalSender<'a>) -> Self {
        Self {
            sender,
            posted_rate: None,
            shut_down: false,
        }
    }

    fn send(&self, event: SignalEvent) -> Result<(), ControlError> {
        if self.shut_down {
            return Err(ControlError::ShutDown);
        }
        if signal::post(&self.sender, event) {
            Ok(())
        } else {
            Err(ControlError::Busy)
        }
    }
}

impl SignalControl for ChannelControl<'_> {
    fn status(&mut self) -> StatusSnapshot {
        let mut snapshot = status::current();
        if let Some(rate) = self.posted_rate {
            snapshot.rate = rate;
        }
        if self.shut_down {
            snapshot.lights = LightState::DARK;
        }
        snapshot
    }

    fn apply_rate(&mut self, rate: Rate) -> Result<(), ControlError> {
        self.send(SignalEvent::SetRate(rate))?;
        self.posted_rate = Some(rate);
        Ok(())
    }

    fn toggle(&mut self) -> Result<(), ControlError> {
        self.send(SignalEvent::Toggle)
    }

    fn call(&mut self) -> Result<(), ControlError> {
        self.send(SignalEvent::Call)
    }

    fn shutdown(&mut self) -> Result<(), ControlError> {
        if self.shut_down {
            return Ok(());
        }
        self.send(SignalEvent::Shutdown)?;
        self.shut_down = true;
        Ok(())
    }
}

/// Line assembly plus command execution for one console connection.
pub struct ConsoleSession<C> {
    lines: LineAssembler,
    executor: CommandExecutor<C>,
}

impl<C: SignalControl> ConsoleSession<C> {
    pub const fn new(control: C) -> Self {
        Self {
            lines: LineAssembler::new(),
            executor: CommandExecutor::new(control),
        }
    }

    /// Drops any partial line, e.g. after the host closes the port.
    pub fn reset(&mut self) {
        self.lines.reset();
    }

    /// Feeds one byte; when it completes a line the reply is appended to `reply`.
    pub fn ingest(&mut self, byte: u8, reply: &mut Reply) {
        let line = match self.lines.ingest(byte) {
            Ok(LineEvent::Pending) => return,
            Ok(LineEvent::Line(line)) => line,
            Err(error) => {
                write_error(error, reply);
                return;
            }
        };

        if let Err(error) = self.executor.execute(line, reply) {
            telemetry::log_console_error(error);
            let _ = writeln!(reply, "error: {error}");
        }
    }
}

fn write_error(error: ConsoleError, reply: &mut Reply) {
    let _ = writeln!(reply, "error: {error}");
}
