use std::io;

#[allow(dead_code)]
#[path = "../session.rs"]
mod session;

use controller_core::config::ControllerConfig;
use session::{Session, TranscriptProfile};

fn main() -> io::Result<()> {
    record_profile(TranscriptProfile::Normal)?;
    record_profile(TranscriptProfile::Pedestrian)?;
    record_profile(TranscriptProfile::Flashing)?;
    Ok(())
}

fn record_profile(profile: TranscriptProfile) -> io::Result<()> {
    let mut session = Session::new(profile, ControllerConfig::new())?;
    let script: &[&str] = match profile {
        TranscriptProfile::Normal => &NORMAL,
        TranscriptProfile::Pedestrian => &PEDESTRIAN,
        TranscriptProfile::Flashing => &FLASHING,
        TranscriptProfile::Interactive | TranscriptProfile::Live => &[],
    };
    for line in script {
        let _ = session.handle_command(line)?;
    }
    Ok(())
}

const NORMAL: [&str; 7] = [
    "status",
    "tick 6",
    "rate 0",
    "rate 10",
    "rate abc",
    "5",
    "tick 6",
];

const PEDESTRIAN: [&str; 8] = [
    "advance 1500",
    "press ped",
    "advance 100",
    "press ped",
    "status",
    "tick 10",
    "status",
    "events",
];

const FLASHING: [&str; 10] = [
    "advance 100",
    "press toggle",
    "advance 10",
    "press toggle",
    "tick 4",
    "advance 300",
    "press toggle",
    "tick 4",
    "toggle",
    "status",
];
