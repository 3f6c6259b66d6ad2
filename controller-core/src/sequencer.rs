//! NORMAL-mode cycle sequencing.
//!
//! A cycle is six ticks long: three green, one yellow, two red. The red phase
//! is the only place a pending pedestrian request may take over, since traffic
//! is already stopped there.

use crate::config::{NORMAL_CYCLE_TICKS, RED_POSITION, YELLOW_POSITION};
use crate::lights::LightState;

/// Traffic phase shown at a cycle position.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Phase {
    Green,
    Yellow,
    Red,
}

impl Phase {
    /// Lamp vector for the phase without any pedestrian override.
    #[must_use]
    pub const fn lights(self) -> LightState {
        match self {
            Phase::Green => LightState::GREEN,
            Phase::Yellow => LightState::YELLOW,
            Phase::Red => LightState::RED,
        }
    }
}

/// Index into the repeating NORMAL-mode sequence.
#[must_use]
pub const fn cycle_position(cycle_count: u32) -> u32 {
    cycle_count % NORMAL_CYCLE_TICKS
}

/// Phase shown for a cycle count.
#[must_use]
pub const fn phase_at(cycle_count: u32) -> Phase {
    let position = cycle_position(cycle_count);
    if position < YELLOW_POSITION {
        Phase::Green
    } else if position < RED_POSITION {
        Phase::Yellow
    } else {
        Phase::Red
    }
}

/// Output of one NORMAL-mode tick with no crossing in progress.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SequencerStep {
    pub phase: Phase,
    pub lights: LightState,
    /// `true` when this tick hands the pending request over to a crossing.
    pub hand_off: bool,
}

/// Computes the lamps for `cycle_count`, honouring a pending pedestrian request.
///
/// On a hand-off tick yellow is forced on next to red as the crossing-start
/// signal.
#[must_use]
pub const fn step(cycle_count: u32, ped_requested: bool) -> SequencerStep {
    let phase = phase_at(cycle_count);
    let hand_off = ped_requested && matches!(phase, Phase::Red);
    let lights = if hand_off {
        LightState::RED_YELLOW
    } else {
        phase.lights()
    };

    SequencerStep {
        phase,
        lights,
        hand_off,
    }
}
