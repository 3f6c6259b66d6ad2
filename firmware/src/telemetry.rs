//! Logging of controller telemetry.
//!
//! The signal task owns the telemetry ring inside its `SignalRuntime`. After
//! each step it asks a [`LogCursor`] to mirror the records it has not printed
//! yet to defmt (or stdout on host builds).

use controller_core::telemetry::{
    EventId, TelemetryEventKind, TelemetryPayload, TelemetryRecord, TelemetryRecorder,
};

use crate::time::FirmwareInstant;

/// Tracks which telemetry records have already been logged.
#[derive(Debug, Default)]
pub struct LogCursor {
    next_id: EventId,
}

impl LogCursor {
    pub const fn new() -> Self {
        Self { next_id: 0 }
    }

    /// Logs every record newer than the last call and returns how many were emitted.
    pub fn drain<const N: usize>(
        &mut self,
        recorder: &TelemetryRecorder<FirmwareInstant, N>,
    ) -> usize {
        let mut emitted = 0;
        for record in recorder.oldest_first() {
            if record.id.wrapping_sub(self.next_id) > EventId::MAX / 2 {
                continue;
            }
            log_record(record);
            self.next_id = record.id.wrapping_add(1);
            emitted += 1;
        }
        emitted
    }
}

/// Argument printed next to an event label; 0 when the event carries none.
fn detail(record: &TelemetryRecord<FirmwareInstant>) -> u32 {
    match (record.event, record.details) {
        (TelemetryEventKind::ModeChanged(mode), _) => u32::from(mode.to_raw()),
        (TelemetryEventKind::CrossingProgress(elapsed), _) => u32::from(elapsed),
        (TelemetryEventKind::EdgeRejected(button), _) => {
            u32::try_from(button.as_index()).unwrap_or(u32::MAX)
        }
        (_, TelemetryPayload::Rate(rate)) => u32::from(rate.to.hz()),
        (_, TelemetryPayload::Crossing(crossing)) => crossing
            .elapsed
            .map_or(0, |elapsed| u32::try_from(elapsed.as_millis()).unwrap_or(u32::MAX)),
        _ => 0,
    }
}

#[cfg(target_os = "none")]
fn log_record(record: &TelemetryRecord<FirmwareInstant>) {
    let label = record.event.label();
    let value = detail(record);
    let timestamp = record.timestamp.as_micros();
    if record.event.is_verbose() {
        defmt::debug!(
            "telemetry:{} #{} {} {} t={}us",
            label,
            record.id,
            record.event.to_raw(),
            value,
            timestamp
        );
    } else {
        defmt::info!(
            "telemetry:{} #{} {} {} t={}us",
            label,
            record.id,
            record.event.to_raw(),
            value,
            timestamp
        );
    }
}

#[cfg(not(target_os = "none"))]
fn log_record(record: &TelemetryRecord<FirmwareInstant>) {
    println!(
        "telemetry:{} #{} {} {} t={}us",
        record.event.label(),
        record.id,
        record.event.to_raw(),
        detail(record),
        record.timestamp.as_micros()
    );
}

#[cfg(target_os = "none")]
pub fn log_console_error(error: controller_core::console::CommandError) {
    match error {
        controller_core::console::CommandError::Parse(_) => {
            defmt::debug!("console: rejected line");
        }
        controller_core::console::CommandError::Output => {
            defmt::warn!("console: reply truncated");
        }
        controller_core::console::CommandError::Control(_) => {
            defmt::warn!("console: command refused");
        }
    }
}

#[cfg(not(target_os = "none"))]
pub fn log_console_error(error: controller_core::console::CommandError) {
    println!("console: {error}");
}

#[cfg(target_os = "none")]
pub fn log_dropped_event(source: &'static str) {
    defmt::warn!("signal: queue full, dropped {} event", source);
}

#[cfg(not(target_os = "none"))]
pub fn log_dropped_event(source: &'static str) {
    println!("signal: queue full, dropped {source} event");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(micros: u64) -> FirmwareInstant {
        FirmwareInstant::from_micros(micros)
    }

    #[test]
    fn drains_only_new_records() {
        let mut recorder = TelemetryRecorder::<FirmwareInstant, 8>::new();
        let mut cursor = LogCursor::new();

        recorder.record_event(TelemetryEventKind::CrossingRequested, at(10));
        recorder.record_event(TelemetryEventKind::CrossingStarted, at(20));
        assert_eq!(cursor.drain(&recorder), 2);
        assert_eq!(cursor.drain(&recorder), 0);

        recorder.record_event(TelemetryEventKind::Shutdown, at(30));
        assert_eq!(cursor.drain(&recorder), 1);
    }

    #[test]
    fn skips_records_lost_to_ring_wrap() {
        let mut recorder = TelemetryRecorder::<FirmwareInstant, 2>::new();
        let mut cursor = LogCursor::new();
        for step in 0..5 {
            recorder.record_event(TelemetryEventKind::CallIgnored, at(step));
        }
        assert_eq!(cursor.drain(&recorder), 2);
    }
}
