//! Signal task plumbing.
//!
//! Every input that may change controller state (raw button edges and
//! console commands) is posted to one queue. The signal task is the
//! only consumer: it owns the `SignalRuntime`, so ticks and events are
//! applied strictly one after another.

use controller_core::debounce::Button;
use controller_core::lights::LightDriver;
use controller_core::rate::Rate;
use controller_core::runtime::SignalRuntime;
#[cfg(not(target_os = "none"))]
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
#[cfg(target_os = "none")]
use embassy_sync::blocking_mutex::raw::ThreadModeRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender, TrySendError};

use crate::status;
use crate::telemetry::{self, LogCursor};
use crate::time::FirmwareInstant;

/// Depth of the queue feeding the signal task.
pub const SIGNAL_QUEUE_DEPTH: usize = 8;

#[cfg(target_os = "none")]
type SignalMutex = ThreadModeRawMutex;
#[cfg(not(target_os = "none"))]
type SignalMutex = NoopRawMutex;

/// Inputs consumed by the signal task.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SignalEvent {
    /// Raw rising edge, still subject to debouncing.
    Edge(Button, FirmwareInstant),
    SetRate(Rate),
    Toggle,
    Call,
    Shutdown,
}

impl SignalEvent {
    const fn source(self) -> &'static str {
        match self {
            SignalEvent::Edge(button, _) => button.label(),
            SignalEvent::SetRate(_) => "rate",
            SignalEvent::Toggle => "toggle",
            SignalEvent::Call => "call",
            SignalEvent::Shutdown => "shutdown",
        }
    }
}

pub type SignalQueue = Channel<SignalMutex, SignalEvent, SIGNAL_QUEUE_DEPTH>;
pub type SignalSender<'a> = Sender<'a, SignalMutex, SignalEvent, SIGNAL_QUEUE_DEPTH>;
pub type SignalReceiver<'a> = Receiver<'a, SignalMutex, SignalEvent, SIGNAL_QUEUE_DEPTH>;

/// Posts an event without blocking; a full queue drops it.
///
/// Returns `false` when the event was dropped.
pub fn post(sender: &SignalSender<'_>, event: SignalEvent) -> bool {
    match sender.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(dropped)) => {
            telemetry::log_dropped_event(dropped.source());
            false
        }
    }
}

/// Runtime specialised for the firmware clock.
pub type FirmwareRuntime<D> = SignalRuntime<FirmwareInstant, D>;

/// Applies one queued event at `now`.
pub fn apply<D: LightDriver>(
    runtime: &mut FirmwareRuntime<D>,
    event: SignalEvent,
    now: FirmwareInstant,
) {
    match event {
        SignalEvent::Edge(button, at) => {
            runtime.on_edge(button, at);
        }
        SignalEvent::SetRate(rate) => {
            runtime.set_rate(rate, now);
        }
        SignalEvent::Toggle => {
            runtime.toggle(now);
        }
        SignalEvent::Call => {
            runtime.call(now);
        }
        SignalEvent::Shutdown => runtime.shutdown(now),
    }
}

/// Publishes the snapshot and logs telemetry after a state change.
pub fn settle<D: LightDriver>(runtime: &FirmwareRuntime<D>, cursor: &mut LogCursor) {
    status::publish(runtime.snapshot());
    cursor.drain(runtime.telemetry());
}

/// Owns the runtime forever: fires ticks at their deadlines and applies queued events.
#[cfg(target_os = "none")]
pub async fn drive<D: LightDriver>(
    mut runtime: FirmwareRuntime<D>,
    receiver: SignalReceiver<'static>,
) -> ! {
    use embassy_futures::select::{Either, select};
    use embassy_time::Timer;

    let mut cursor = LogCursor::new();
    settle(&runtime, &mut cursor);

    loop {
        let event = match runtime.next_deadline() {
            Some(deadline) => {
                match select(Timer::at(deadline.into_embassy()), receiver.receive()).await {
                    Either::First(()) => None,
                    Either::Second(event) => Some(event),
                }
            }
            None => Some(receiver.receive().await),
        };

        let now = FirmwareInstant::now();
        match event {
            Some(event) => apply(&mut runtime, event, now),
            None => {
                runtime.poll(now);
            }
        }
        settle(&runtime, &mut cursor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use controller_core::config::ControllerConfig;
    use controller_core::lights::{LightState, NoopLightDriver};
    use controller_core::mode::Mode;

    fn at(millis: u64) -> FirmwareInstant {
        FirmwareInstant::from_micros(millis * 1_000)
    }

    fn runtime() -> FirmwareRuntime<NoopLightDriver> {
        SignalRuntime::start(ControllerConfig::new(), NoopLightDriver::new(), at(0))
    }

    #[test]
    fn queued_edges_are_debounced_by_timestamp() {
        let mut runtime = runtime();
        apply(&mut runtime, SignalEvent::Edge(Button::Toggle, at(100)), at(105));
        apply(&mut runtime, SignalEvent::Edge(Button::Toggle, at(110)), at(112));
        assert_eq!(runtime.state().mode(), Mode::FlashingRed);
    }

    #[test]
    fn console_events_apply_directly() {
        let mut runtime = runtime();
        apply(&mut runtime, SignalEvent::SetRate(Rate::new(9).unwrap()), at(1));
        apply(&mut runtime, SignalEvent::Call, at(2));
        assert_eq!(runtime.state().rate().hz(), 9);
        assert!(runtime.state().ped_requested());

        apply(&mut runtime, SignalEvent::Shutdown, at(3));
        assert_eq!(runtime.snapshot().lights, LightState::DARK);
        assert!(runtime.next_deadline().is_none());
    }

    #[test]
    fn full_queue_drops_events() {
        let queue = SignalQueue::new();
        let sender = queue.sender();
        for _ in 0..SIGNAL_QUEUE_DEPTH {
            assert!(post(&sender, SignalEvent::Call));
        }
        assert!(!post(&sender, SignalEvent::Toggle));
        assert_eq!(queue.try_receive().ok(), Some(SignalEvent::Call));
    }
}
