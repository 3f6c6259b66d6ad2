//! Telemetry event catalog and ring-buffered recorder shared by firmware and host targets.
//!
//! Event kinds encode to compact numeric codes so the firmware can emit them
//! over defmt without string tables, while the host renders them with
//! [`fmt::Display`] for transcripts. The recorder keeps the most recent events
//! in a fixed-size [`HistoryBuf`] and derives wait and crossing durations from
//! the timestamps it has already seen.

use core::{fmt, time::Duration};

use heapless::{HistoryBuf, OldestOrdered};

use crate::controller::{CrossingDisposition, ModeSwitch};
use crate::debounce::Button;
use crate::mode::Mode;
use crate::rate::Rate;

/// Monotonic identifier assigned to every telemetry record.
pub type EventId = u32;

/// Discriminated telemetry events.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TelemetryEventKind {
    ModeChanged(Mode),
    ToggleDeferred,
    CrossingRequested,
    CrossingStarted,
    /// Crossing tick that held red and yellow; carries the elapsed tick count.
    CrossingProgress(u8),
    CrossingComplete,
    CrossingAborted,
    CallIgnored,
    EdgeRejected(Button),
    RateChanged,
    RateRejected,
    Shutdown,
    Custom(u16),
}

impl fmt::Display for TelemetryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryEventKind::ModeChanged(mode) => write!(f, "mode-changed {mode}"),
            TelemetryEventKind::ToggleDeferred => f.write_str("toggle-deferred"),
            TelemetryEventKind::CrossingRequested => f.write_str("crossing-requested"),
            TelemetryEventKind::CrossingStarted => f.write_str("crossing-started"),
            TelemetryEventKind::CrossingProgress(elapsed) => {
                write!(f, "crossing-progress {elapsed}")
            }
            TelemetryEventKind::CrossingComplete => f.write_str("crossing-complete"),
            TelemetryEventKind::CrossingAborted => f.write_str("crossing-aborted"),
            TelemetryEventKind::CallIgnored => f.write_str("call-ignored"),
            TelemetryEventKind::EdgeRejected(button) => write!(f, "edge-rejected {button}"),
            TelemetryEventKind::RateChanged => f.write_str("rate-changed"),
            TelemetryEventKind::RateRejected => f.write_str("rate-rejected"),
            TelemetryEventKind::Shutdown => f.write_str("shutdown"),
            TelemetryEventKind::Custom(code) => write!(f, "custom({code})"),
        }
    }
}

impl TelemetryEventKind {
    const MODE_CHANGED_BASE: u16 = 0x0000;
    const TOGGLE_DEFERRED_CODE: u16 = 0x0004;
    const CROSSING_REQUESTED_CODE: u16 = 0x0010;
    const CROSSING_STARTED_CODE: u16 = 0x0011;
    const CROSSING_COMPLETE_CODE: u16 = 0x0012;
    const CROSSING_ABORTED_CODE: u16 = 0x0013;
    const CALL_IGNORED_CODE: u16 = 0x0014;
    const EDGE_REJECTED_BASE: u16 = 0x0020;
    const RATE_CHANGED_CODE: u16 = 0x0030;
    const RATE_REJECTED_CODE: u16 = 0x0031;
    const SHUTDOWN_CODE: u16 = 0x00F0;
    const CROSSING_PROGRESS_BASE: u16 = 0x0100;

    /// Stable name without arguments, for log backends that cannot format.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            TelemetryEventKind::ModeChanged(_) => "mode-changed",
            TelemetryEventKind::ToggleDeferred => "toggle-deferred",
            TelemetryEventKind::CrossingRequested => "crossing-requested",
            TelemetryEventKind::CrossingStarted => "crossing-started",
            TelemetryEventKind::CrossingProgress(_) => "crossing-progress",
            TelemetryEventKind::CrossingComplete => "crossing-complete",
            TelemetryEventKind::CrossingAborted => "crossing-aborted",
            TelemetryEventKind::CallIgnored => "call-ignored",
            TelemetryEventKind::EdgeRejected(_) => "edge-rejected",
            TelemetryEventKind::RateChanged => "rate-changed",
            TelemetryEventKind::RateRejected => "rate-rejected",
            TelemetryEventKind::Shutdown => "shutdown",
            TelemetryEventKind::Custom(_) => "custom",
        }
    }

    /// Returns `true` for high-frequency events logged at debug level.
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(
            self,
            TelemetryEventKind::CrossingProgress(_) | TelemetryEventKind::EdgeRejected(_)
        )
    }

    /// Encodes the event into a compact transport-friendly discriminant.
    #[must_use]
    pub const fn to_raw(self) -> u16 {
        match self {
            TelemetryEventKind::ModeChanged(mode) => Self::MODE_CHANGED_BASE + mode.to_raw() as u16,
            TelemetryEventKind::ToggleDeferred => Self::TOGGLE_DEFERRED_CODE,
            TelemetryEventKind::CrossingRequested => Self::CROSSING_REQUESTED_CODE,
            TelemetryEventKind::CrossingStarted => Self::CROSSING_STARTED_CODE,
            TelemetryEventKind::CrossingProgress(elapsed) => {
                Self::CROSSING_PROGRESS_BASE + elapsed as u16
            }
            TelemetryEventKind::CrossingComplete => Self::CROSSING_COMPLETE_CODE,
            TelemetryEventKind::CrossingAborted => Self::CROSSING_ABORTED_CODE,
            TelemetryEventKind::CallIgnored => Self::CALL_IGNORED_CODE,
            TelemetryEventKind::EdgeRejected(button) => {
                Self::EDGE_REJECTED_BASE + button.to_raw() as u16
            }
            TelemetryEventKind::RateChanged => Self::RATE_CHANGED_CODE,
            TelemetryEventKind::RateRejected => Self::RATE_REJECTED_CODE,
            TelemetryEventKind::Shutdown => Self::SHUTDOWN_CODE,
            TelemetryEventKind::Custom(code) => code,
        }
    }

    /// Decodes a raw discriminant, falling back to [`TelemetryEventKind::Custom`].
    #[must_use]
    pub fn from_raw(code: u16) -> Self {
        match code {
            Self::TOGGLE_DEFERRED_CODE => TelemetryEventKind::ToggleDeferred,
            Self::CROSSING_REQUESTED_CODE => TelemetryEventKind::CrossingRequested,
            Self::CROSSING_STARTED_CODE => TelemetryEventKind::CrossingStarted,
            Self::CROSSING_COMPLETE_CODE => TelemetryEventKind::CrossingComplete,
            Self::CROSSING_ABORTED_CODE => TelemetryEventKind::CrossingAborted,
            Self::CALL_IGNORED_CODE => TelemetryEventKind::CallIgnored,
            Self::RATE_CHANGED_CODE => TelemetryEventKind::RateChanged,
            Self::RATE_REJECTED_CODE => TelemetryEventKind::RateRejected,
            Self::SHUTDOWN_CODE => TelemetryEventKind::Shutdown,
            value if (Self::MODE_CHANGED_BASE..Self::TOGGLE_DEFERRED_CODE).contains(&value) => {
                let offset = value - Self::MODE_CHANGED_BASE;
                u8::try_from(offset)
                    .ok()
                    .and_then(Mode::from_raw)
                    .map_or(TelemetryEventKind::Custom(value), TelemetryEventKind::ModeChanged)
            }
            value if (Self::EDGE_REJECTED_BASE..Self::EDGE_REJECTED_BASE + 2).contains(&value) => {
                let offset = usize::from(value - Self::EDGE_REJECTED_BASE);
                TelemetryEventKind::EdgeRejected(Button::ALL[offset])
            }
            value
                if (Self::CROSSING_PROGRESS_BASE..Self::CROSSING_PROGRESS_BASE + 0x0100)
                    .contains(&value) =>
            {
                let elapsed = value - Self::CROSSING_PROGRESS_BASE;
                u8::try_from(elapsed).map_or(
                    TelemetryEventKind::Custom(value),
                    TelemetryEventKind::CrossingProgress,
                )
            }
            other => TelemetryEventKind::Custom(other),
        }
    }
}

/// Payloads carried alongside telemetry events.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TelemetryPayload {
    /// No additional metadata accompanies the event.
    None,
    Mode(ModeTelemetry),
    Crossing(CrossingTelemetry),
    Rate(RateTelemetry),
}

impl TelemetryPayload {
    #[must_use]
    pub const fn none() -> Self {
        TelemetryPayload::None
    }
}

/// Mode transition payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ModeTelemetry {
    pub from: Mode,
    pub to: Mode,
    /// A pending request or crossing was dropped by the transition.
    pub aborted_crossing: bool,
}

/// Crossing lifecycle payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CrossingTelemetry {
    /// Time since the request was latched (started) or since the crossing began (complete).
    pub elapsed: Option<Duration>,
}

/// Rate change payload.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RateTelemetry {
    pub from: Rate,
    pub to: Rate,
}

/// Total number of telemetry entries retained in memory.
pub const TELEMETRY_RING_CAPACITY: usize = 64;

/// Trait implemented by monotonic instant types used for telemetry tracking.
pub trait TelemetryInstant: Copy {
    /// Returns the saturating duration from `earlier` to `self`.
    fn saturating_duration_since(&self, earlier: Self) -> Duration;
}

/// Host clocks count elapsed time from an arbitrary origin.
impl TelemetryInstant for Duration {
    fn saturating_duration_since(&self, earlier: Self) -> Duration {
        self.saturating_sub(earlier)
    }
}

/// Telemetry record stored in the ring buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TelemetryRecord<TInstant>
where
    TInstant: Copy,
{
    pub id: EventId,
    pub timestamp: TInstant,
    pub event: TelemetryEventKind,
    pub details: TelemetryPayload,
}

impl<TInstant: Copy> fmt::Display for TelemetryRecord<TInstant> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.event)?;
        match self.details {
            TelemetryPayload::None => Ok(()),
            TelemetryPayload::Mode(details) => {
                write!(f, " from={} to={}", details.from, details.to)?;
                if details.aborted_crossing {
                    f.write_str(" aborted-crossing")?;
                }
                Ok(())
            }
            TelemetryPayload::Crossing(details) => match details.elapsed {
                Some(elapsed) => write!(f, " elapsed={}ms", elapsed.as_millis()),
                None => Ok(()),
            },
            TelemetryPayload::Rate(details) => {
                write!(f, " from={} to={}", details.from.hz(), details.to.hz())
            }
        }
    }
}

/// Telemetry ring buffer type alias.
pub type TelemetryRing<TInstant, const CAPACITY: usize = TELEMETRY_RING_CAPACITY> =
    HistoryBuf<TelemetryRecord<TInstant>, CAPACITY>;

/// Records telemetry events into a fixed-size ring buffer.
pub struct TelemetryRecorder<TInstant, const CAPACITY: usize = TELEMETRY_RING_CAPACITY>
where
    TInstant: Copy,
{
    ring: TelemetryRing<TInstant, CAPACITY>,
    requested_at: Option<TInstant>,
    crossing_started_at: Option<TInstant>,
    next_event_id: EventId,
}

impl<TInstant, const CAPACITY: usize> TelemetryRecorder<TInstant, CAPACITY>
where
    TInstant: Copy + TelemetryInstant,
{
    /// Creates a new telemetry recorder with an empty history.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ring: HistoryBuf::new(),
            requested_at: None,
            crossing_started_at: None,
            next_event_id: 0,
        }
    }

    /// Returns an iterator over the recorded telemetry in chronological order.
    #[must_use]
    pub fn oldest_first(&self) -> OldestOrdered<'_, TelemetryRecord<TInstant>> {
        self.ring.oldest_ordered()
    }

    /// Returns the most recent telemetry record, if available.
    #[must_use]
    pub fn latest(&self) -> Option<&TelemetryRecord<TInstant>> {
        self.ring.recent()
    }

    /// Copies out every retained record whose id is `first` or newer.
    #[cfg(feature = "alloc")]
    #[must_use]
    pub fn since(&self, first: EventId) -> alloc::vec::Vec<TelemetryRecord<TInstant>> {
        self.oldest_first()
            .filter(|record| record.id.wrapping_sub(first) <= EventId::MAX / 2)
            .copied()
            .collect()
    }

    /// Id the next recorded event will receive.
    #[must_use]
    pub fn next_id(&self) -> EventId {
        self.next_event_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Records a mode transition.
    pub fn record_mode_change(&mut self, switch: ModeSwitch, timestamp: TInstant) -> EventId {
        let aborted_crossing = matches!(switch.crossing, CrossingDisposition::Aborted);
        if aborted_crossing {
            self.requested_at = None;
            self.crossing_started_at = None;
        }
        let payload = TelemetryPayload::Mode(ModeTelemetry {
            from: switch.from,
            to: switch.to,
            aborted_crossing,
        });
        self.record(TelemetryEventKind::ModeChanged(switch.to), payload, timestamp)
    }

    /// Records a latched pedestrian request.
    pub fn record_crossing_requested(&mut self, timestamp: TInstant) -> EventId {
        self.requested_at = Some(timestamp);
        self.record(
            TelemetryEventKind::CrossingRequested,
            TelemetryPayload::none(),
            timestamp,
        )
    }

    /// Records the start of a crossing with the time the pedestrian waited.
    pub fn record_crossing_started(&mut self, timestamp: TInstant) -> EventId {
        let waited = self
            .requested_at
            .take()
            .map(|requested| timestamp.saturating_duration_since(requested));
        self.crossing_started_at = Some(timestamp);
        self.record(
            TelemetryEventKind::CrossingStarted,
            TelemetryPayload::Crossing(CrossingTelemetry { elapsed: waited }),
            timestamp,
        )
    }

    /// Records the end of a crossing with its total duration.
    pub fn record_crossing_complete(&mut self, timestamp: TInstant) -> EventId {
        let duration = self
            .crossing_started_at
            .take()
            .map(|started| timestamp.saturating_duration_since(started));
        self.record(
            TelemetryEventKind::CrossingComplete,
            TelemetryPayload::Crossing(CrossingTelemetry { elapsed: duration }),
            timestamp,
        )
    }

    /// Records a rate change.
    pub fn record_rate_change(&mut self, from: Rate, to: Rate, timestamp: TInstant) -> EventId {
        self.record(
            TelemetryEventKind::RateChanged,
            TelemetryPayload::Rate(RateTelemetry { from, to }),
            timestamp,
        )
    }

    /// Records an event that carries no payload.
    pub fn record_event(&mut self, event: TelemetryEventKind, timestamp: TInstant) -> EventId {
        self.record(event, TelemetryPayload::none(), timestamp)
    }

    /// Records an arbitrary telemetry event with the supplied payload.
    pub fn record(
        &mut self,
        event: TelemetryEventKind,
        payload: TelemetryPayload,
        timestamp: TInstant,
    ) -> EventId {
        let id = self.next_event_id;
        self.next_event_id = self.next_event_id.wrapping_add(1);

        self.ring.write(TelemetryRecord {
            id,
            timestamp,
            event,
            details: payload,
        });

        id
    }
}

impl<TInstant, const CAPACITY: usize> Default for TelemetryRecorder<TInstant, CAPACITY>
where
    TInstant: Copy + TelemetryInstant,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd)]
    struct MicrosInstant(u64);

    impl TelemetryInstant for MicrosInstant {
        fn saturating_duration_since(&self, earlier: Self) -> Duration {
            Duration::from_micros(self.0.saturating_sub(earlier.0))
        }
    }

    #[test]
    fn event_codes_decode_to_same_kind() {
        let fixtures = [
            TelemetryEventKind::ModeChanged(Mode::FlashingYellow),
            TelemetryEventKind::CrossingStarted,
            TelemetryEventKind::CrossingProgress(3),
            TelemetryEventKind::EdgeRejected(Button::Pedestrian),
            TelemetryEventKind::Shutdown,
        ];
        for kind in fixtures {
            assert_eq!(TelemetryEventKind::from_raw(kind.to_raw()), kind);
        }
        assert_eq!(
            TelemetryEventKind::from_raw(0x0003),
            TelemetryEventKind::Custom(0x0003)
        );
    }

    #[test]
    fn crossing_records_wait_and_duration() {
        let mut recorder = TelemetryRecorder::<MicrosInstant>::new();
        recorder.record_crossing_requested(MicrosInstant(1_000));
        recorder.record_crossing_started(MicrosInstant(4_000));

        let started = recorder.latest().copied().unwrap();
        assert_eq!(started.event, TelemetryEventKind::CrossingStarted);
        assert_eq!(
            started.details,
            TelemetryPayload::Crossing(CrossingTelemetry {
                elapsed: Some(Duration::from_micros(3_000))
            })
        );

        let id = recorder.record_crossing_complete(MicrosInstant(10_000));
        assert_eq!(id, 2);
        let complete = recorder.latest().copied().unwrap();
        assert_eq!(
            complete.details,
            TelemetryPayload::Crossing(CrossingTelemetry {
                elapsed: Some(Duration::from_micros(6_000))
            })
        );
    }

    #[test]
    fn aborting_mode_change_forgets_pending_crossing() {
        let mut recorder = TelemetryRecorder::<MicrosInstant>::new();
        recorder.record_crossing_requested(MicrosInstant(0));
        recorder.record_mode_change(
            ModeSwitch {
                from: Mode::Normal,
                to: Mode::FlashingRed,
                crossing: CrossingDisposition::Aborted,
            },
            MicrosInstant(50),
        );
        recorder.record_crossing_started(MicrosInstant(100));

        let started = recorder.latest().copied().unwrap();
        assert_eq!(
            started.details,
            TelemetryPayload::Crossing(CrossingTelemetry { elapsed: None })
        );
    }

    #[test]
    fn ring_keeps_most_recent_records() {
        let mut recorder = TelemetryRecorder::<Duration, 4>::new();
        for step in 0..6u64 {
            recorder.record_event(TelemetryEventKind::CallIgnored, Duration::from_millis(step));
        }
        assert_eq!(recorder.len(), 4);
        let ids: heapless::Vec<EventId, 4> = recorder.oldest_first().map(|record| record.id).collect();
        assert_eq!(ids.as_slice(), &[2, 3, 4, 5]);
    }
}
