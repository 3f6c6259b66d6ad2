//! Event-driven glue between inputs, the controller and the lamps.
//!
//! [`SignalRuntime`] owns everything one signal head needs: the controller,
//! the tick scheduler, the button debouncers, the light driver and a telemetry
//! ring. Front-ends feed it timestamps and raw edges; it serialises every
//! mutation through `&mut self`, which is how the firmware task and the host
//! emulator both satisfy the single-writer requirement on controller state.

use core::ops::Add;
use core::time::Duration;

use crate::config::ControllerConfig;
use crate::controller::{
    Controller, ControllerState, CrossingDisposition, CrossingEvent, RateUpdate, TickReport,
    ToggleOutcome,
};
use crate::debounce::{Button, ButtonDebouncers};
use crate::lights::{LightDriver, LightState};
use crate::pedestrian::CallOutcome;
use crate::rate::Rate;
use crate::scheduler::TickScheduler;
use crate::status::{StatusProvider, StatusSnapshot};
use crate::telemetry::{
    TELEMETRY_RING_CAPACITY, TelemetryEventKind, TelemetryInstant, TelemetryRecorder,
};

/// What a raw button edge turned into.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EdgeOutcome {
    /// Dropped by the debounce filter.
    Debounced,
    Toggle(ToggleOutcome),
    Call(CallOutcome),
    /// The controller has shut down; inputs are ignored.
    Inactive,
}

/// Single-owner runtime for one signal head.
pub struct SignalRuntime<I, D, const N: usize = TELEMETRY_RING_CAPACITY>
where
    I: Copy,
{
    controller: Controller,
    scheduler: TickScheduler<I>,
    buttons: ButtonDebouncers<I>,
    driver: D,
    telemetry: TelemetryRecorder<I, N>,
}

impl<I, D, const N: usize> SignalRuntime<I, D, N>
where
    I: Copy + Ord + Add<Duration, Output = I> + TelemetryInstant,
    D: LightDriver,
{
    /// Lights green and arms the first tick one period after `now`.
    #[must_use]
    pub fn start(config: ControllerConfig, mut driver: D, now: I) -> Self {
        let controller = Controller::new(config);
        driver.apply(LightState::GREEN);

        let mut scheduler = TickScheduler::new();
        scheduler.start(now, controller.state().rate());

        Self {
            controller,
            scheduler,
            buttons: ButtonDebouncers::new(config.debounce_window),
            driver,
            telemetry: TelemetryRecorder::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &ControllerState {
        self.controller.state()
    }

    #[must_use]
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    #[must_use]
    pub fn telemetry(&self) -> &TelemetryRecorder<I, N> {
        &self.telemetry
    }

    #[must_use]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Instant at which [`SignalRuntime::poll`] next has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<I> {
        self.scheduler.deadline()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Runs the tick if its deadline has passed.
    pub fn poll(&mut self, now: I) -> Option<TickReport> {
        let report = self
            .scheduler
            .fire(now, &mut self.controller, &mut self.driver)?;

        match report.crossing {
            Some(CrossingEvent::Started) => {
                self.telemetry.record_crossing_started(now);
            }
            Some(CrossingEvent::Progress { elapsed }) => {
                self.telemetry
                    .record_event(TelemetryEventKind::CrossingProgress(elapsed), now);
            }
            Some(CrossingEvent::Complete) => {
                self.telemetry.record_crossing_complete(now);
            }
            None => {}
        }
        if let Some(switch) = report.deferred_switch {
            self.telemetry.record_mode_change(switch, now);
        }

        Some(report)
    }

    /// Filters a raw rising edge and forwards it to the controller.
    pub fn on_edge(&mut self, button: Button, now: I) -> EdgeOutcome {
        if self.controller.is_shut_down() {
            return EdgeOutcome::Inactive;
        }
        if !self.buttons.accept(button, now) {
            self.telemetry
                .record_event(TelemetryEventKind::EdgeRejected(button), now);
            return EdgeOutcome::Debounced;
        }

        match button {
            Button::Toggle => EdgeOutcome::Toggle(self.toggle(now)),
            Button::Pedestrian => EdgeOutcome::Call(self.call(now)),
        }
    }

    /// Applies an already-debounced toggle event.
    pub fn toggle(&mut self, now: I) -> ToggleOutcome {
        let outcome = self.controller.on_toggle();
        match outcome {
            ToggleOutcome::Switched(switch) => {
                if switch.crossing == CrossingDisposition::Aborted {
                    self.telemetry
                        .record_event(TelemetryEventKind::CrossingAborted, now);
                }
                self.telemetry.record_mode_change(switch, now);
            }
            ToggleOutcome::Deferred { .. } => {
                self.telemetry
                    .record_event(TelemetryEventKind::ToggleDeferred, now);
            }
            ToggleOutcome::Inactive => {}
        }
        outcome
    }

    /// Applies an already-debounced pedestrian call.
    pub fn call(&mut self, now: I) -> CallOutcome {
        let outcome = self.controller.on_call();
        match outcome {
            CallOutcome::Latched => {
                self.telemetry.record_crossing_requested(now);
            }
            CallOutcome::Inactive => {}
            CallOutcome::IgnoredMode(_)
            | CallOutcome::AlreadyRequested
            | CallOutcome::CrossingActive => {
                self.telemetry
                    .record_event(TelemetryEventKind::CallIgnored, now);
            }
        }
        outcome
    }

    /// Applies operator text; invalid input leaves the rate unchanged.
    pub fn configure_rate(&mut self, input: &[u8], now: I) -> RateUpdate {
        let update = self.controller.configure_rate(input);
        self.record_rate_update(update, now);
        update
    }

    /// Applies an already-validated rate.
    pub fn set_rate(&mut self, rate: Rate, now: I) -> RateUpdate {
        let update = self.controller.set_rate(rate);
        self.record_rate_update(update, now);
        update
    }

    fn record_rate_update(&mut self, update: RateUpdate, now: I) {
        match update {
            RateUpdate::Applied { from, to } => {
                self.telemetry.record_rate_change(from, to, now);
            }
            RateUpdate::Ignored { .. } => {
                self.telemetry
                    .record_event(TelemetryEventKind::RateRejected, now);
            }
            RateUpdate::Inactive { .. } => {}
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        self.controller.snapshot()
    }

    /// Stops the scheduler, then forces every lamp dark.
    pub fn shutdown(&mut self, now: I) {
        if self.controller.is_shut_down() {
            return;
        }
        self.scheduler.stop();
        self.controller.shutdown(&mut self.driver);
        self.telemetry.record_event(TelemetryEventKind::Shutdown, now);
    }

    /// Releases the light driver.
    #[must_use]
    pub fn into_driver(self) -> D {
        self.driver
    }
}

impl<I, D, const N: usize> StatusProvider for SignalRuntime<I, D, N>
where
    I: Copy + Ord + Add<Duration, Output = I> + TelemetryInstant,
    D: LightDriver,
{
    fn status(&self) -> StatusSnapshot {
        self.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lights::NoopLightDriver;
    use crate::mode::Mode;

    fn runtime() -> SignalRuntime<Duration, NoopLightDriver> {
        SignalRuntime::start(ControllerConfig::new(), NoopLightDriver::new(), Duration::ZERO)
    }

    #[test]
    fn start_arms_first_tick() {
        let runtime = runtime();
        assert_eq!(runtime.next_deadline(), Some(Duration::from_secs(1)));
        assert_eq!(runtime.snapshot(), StatusSnapshot::initial());
    }

    #[test]
    fn bouncing_toggle_changes_mode_once() {
        let mut runtime = runtime();
        let first = runtime.on_edge(Button::Toggle, Duration::from_millis(100));
        assert!(matches!(first, EdgeOutcome::Toggle(ToggleOutcome::Switched(_))));
        assert_eq!(
            runtime.on_edge(Button::Toggle, Duration::from_millis(120)),
            EdgeOutcome::Debounced
        );
        assert_eq!(runtime.state().mode(), Mode::FlashingRed);
    }

    #[test]
    fn shutdown_stops_ticks_and_inputs() {
        let mut runtime = runtime();
        runtime.shutdown(Duration::from_millis(10));
        assert!(!runtime.is_running());
        assert!(runtime.poll(Duration::from_secs(5)).is_none());
        assert_eq!(
            runtime.on_edge(Button::Pedestrian, Duration::from_secs(6)),
            EdgeOutcome::Inactive
        );
        assert_eq!(runtime.snapshot().lights, LightState::DARK);
        assert_eq!(
            runtime.telemetry().latest().map(|record| record.event),
            Some(TelemetryEventKind::Shutdown)
        );
    }

    #[test]
    fn console_inputs_after_shutdown_are_inert() {
        let mut runtime = runtime();
        runtime.shutdown(Duration::from_millis(1));
        let recorded = runtime.telemetry().len();

        assert_eq!(runtime.toggle(Duration::from_millis(2)), ToggleOutcome::Inactive);
        assert_eq!(runtime.call(Duration::from_millis(3)), CallOutcome::Inactive);
        assert_eq!(
            runtime.set_rate(Rate::new(7).unwrap(), Duration::from_millis(4)),
            RateUpdate::Inactive {
                current: Rate::DEFAULT
            }
        );

        let state = runtime.state();
        assert_eq!(state.mode(), Mode::Normal);
        assert_eq!(state.rate(), Rate::DEFAULT);
        assert!(!state.pedestrian_present());
        assert_eq!(runtime.snapshot().lights, LightState::DARK);
        assert_eq!(runtime.telemetry().len(), recorded);
    }
}
