//! One-shot tick scheduling.
//!
//! The scheduler holds a single deadline. When it fires it runs one controller
//! tick, pushes the result to the lamps and re-arms itself one period of the
//! *current* rate after the firing instant, so a rate change takes effect on
//! the next re-arm. Stopping clears the deadline; no tick runs after
//! [`TickScheduler::stop`] returns.

use core::ops::Add;
use core::time::Duration;

use crate::controller::{Controller, TickReport};
use crate::lights::LightDriver;
use crate::rate::Rate;

/// Single-deadline tick timer driven by an external clock.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TickScheduler<I> {
    deadline: Option<I>,
    fired: u32,
}

impl<I> TickScheduler<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    #[must_use]
    pub const fn new() -> Self {
        Self {
            deadline: None,
            fired: 0,
        }
    }

    /// Arms the first tick one period after `now`.
    pub fn start(&mut self, now: I, rate: Rate) {
        self.deadline = Some(now + rate.period());
    }

    /// Next firing instant, or `None` once stopped.
    #[must_use]
    pub const fn deadline(&self) -> Option<I> {
        self.deadline
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.deadline.is_some()
    }

    /// Number of ticks fired since creation.
    #[must_use]
    pub const fn fired(&self) -> u32 {
        self.fired
    }

    #[must_use]
    pub fn is_due(&self, now: I) -> bool {
        matches!(self.deadline, Some(deadline) if now >= deadline)
    }

    /// Runs one tick if the deadline has passed and re-arms from `now`.
    pub fn fire<D>(&mut self, now: I, controller: &mut Controller, driver: &mut D) -> Option<TickReport>
    where
        D: LightDriver,
    {
        if !self.is_due(now) {
            return None;
        }

        let report = controller.tick();
        driver.apply(report.lights);
        self.fired = self.fired.wrapping_add(1);
        self.deadline = Some(now + controller.state().rate().period());
        Some(report)
    }

    /// Cancels the pending deadline.
    pub fn stop(&mut self) {
        self.deadline = None;
    }
}

impl<I> Default for TickScheduler<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    fn default() -> Self {
        Self::new()
    }
}
