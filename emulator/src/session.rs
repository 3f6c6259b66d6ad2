use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use controller_core::config::ControllerConfig;
use controller_core::console::{
    CommandError, CommandExecutor, CommandOutcome, ControlError, SignalControl,
};
use controller_core::controller::{CrossingEvent, RateUpdate, TickReport, ToggleOutcome};
use controller_core::debounce::Button;
use controller_core::lights::{LightChannel, LightDriver, LightState};
use controller_core::pedestrian::CallOutcome;
use controller_core::rate::Rate;
use controller_core::runtime::{EdgeOutcome, SignalRuntime};
use controller_core::status::StatusSnapshot;
use controller_core::telemetry::EventId;

/// Emulator-only commands, listed after the shared console help.
pub const BENCH_HELP: &[(&str, &str)] = &[
    ("advance", "advance <ms>      move the simulated clock forward"),
    ("tick", "tick [n]          run the next n scheduled ticks (default 1)"),
    ("press", "press toggle|ped  raw button edge, subject to debouncing"),
    ("events", "events            dump the retained telemetry ring"),
];

/// Upper bound for a single `tick` request.
const MAX_TICKS_PER_COMMAND: u32 = 1_000;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TranscriptProfile {
    Interactive,
    Normal,
    Pedestrian,
    Flashing,
    Live,
}

impl TranscriptProfile {
    pub fn log_path(self) -> &'static str {
        match self {
            TranscriptProfile::Interactive => "transcripts/emulator-interactive.log",
            TranscriptProfile::Normal => "transcripts/emulator-normal.log",
            TranscriptProfile::Pedestrian => "transcripts/emulator-pedestrian.log",
            TranscriptProfile::Flashing => "transcripts/emulator-flashing.log",
            TranscriptProfile::Live => "transcripts/emulator-live.log",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            TranscriptProfile::Interactive => "Signal Controller Emulator interactive transcript",
            TranscriptProfile::Normal => "Signal Controller Emulator normal cycle transcript",
            TranscriptProfile::Pedestrian => "Signal Controller Emulator pedestrian crossing transcript",
            TranscriptProfile::Flashing => "Signal Controller Emulator flashing modes transcript",
            TranscriptProfile::Live => "Signal Controller Emulator live transcript",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, String> {
        [
            Self::Interactive,
            Self::Normal,
            Self::Pedestrian,
            Self::Flashing,
            Self::Live,
        ]
        .into_iter()
        .find(|profile| profile.tag().eq_ignore_ascii_case(tag))
        .ok_or_else(|| format!("Unknown transcript profile `{tag}`"))
    }

    fn tag(self) -> &'static str {
        match self {
            TranscriptProfile::Interactive => "interactive",
            TranscriptProfile::Normal => "normal",
            TranscriptProfile::Pedestrian => "pedestrian",
            TranscriptProfile::Flashing => "flashing",
            TranscriptProfile::Live => "live",
        }
    }
}

/// Lamps rendered in memory.
#[derive(Debug, Default)]
pub struct HostLights {
    state: LightState,
    writes: usize,
}

impl HostLights {
    pub fn state(&self) -> LightState {
        self.state
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl LightDriver for HostLights {
    fn set(&mut self, channel: LightChannel, active: bool) {
        match channel {
            LightChannel::Red => self.state.red = active,
            LightChannel::Yellow => self.state.yellow = active,
            LightChannel::Green => self.state.green = active,
        }
        self.writes += 1;
    }
}

/// Runtime plus the simulated clock it runs against.
pub struct Bench {
    runtime: SignalRuntime<Duration, HostLights>,
    clock: Duration,
}

impl Bench {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            runtime: SignalRuntime::start(config, HostLights::default(), Duration::ZERO),
            clock: Duration::ZERO,
        }
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn runtime(&self) -> &SignalRuntime<Duration, HostLights> {
        &self.runtime
    }

    /// Moves the clock to `target`, firing every tick that falls due on the way.
    pub fn advance_to(&mut self, target: Duration) -> Vec<(Duration, TickReport)> {
        let mut reports = Vec::new();
        while let Some(deadline) = self.runtime.next_deadline() {
            if deadline > target {
                break;
            }
            self.clock = deadline;
            if let Some(report) = self.runtime.poll(deadline) {
                reports.push((deadline, report));
            }
        }
        self.clock = self.clock.max(target);
        reports
    }

    /// Runs up to `count` ticks, jumping the clock to each deadline.
    pub fn run_ticks(&mut self, count: u32) -> Vec<(Duration, TickReport)> {
        let mut reports = Vec::new();
        for _ in 0..count {
            let Some(deadline) = self.runtime.next_deadline() else {
                break;
            };
            reports.extend(self.advance_to(deadline));
        }
        reports
    }

    pub fn press(&mut self, button: Button) -> EdgeOutcome {
        self.runtime.on_edge(button, self.clock)
    }
}

impl SignalControl for Bench {
    fn status(&mut self) -> StatusSnapshot {
        self.runtime.snapshot()
    }

    fn apply_rate(&mut self, rate: Rate) -> Result<(), ControlError> {
        match self.runtime.set_rate(rate, self.clock) {
            RateUpdate::Inactive { .. } => Err(ControlError::ShutDown),
            RateUpdate::Applied { .. } | RateUpdate::Ignored { .. } => Ok(()),
        }
    }

    fn toggle(&mut self) -> Result<(), ControlError> {
        match self.runtime.toggle(self.clock) {
            ToggleOutcome::Inactive => Err(ControlError::ShutDown),
            ToggleOutcome::Switched(_) | ToggleOutcome::Deferred { .. } => Ok(()),
        }
    }

    fn call(&mut self) -> Result<(), ControlError> {
        match self.runtime.call(self.clock) {
            CallOutcome::Inactive => Err(ControlError::ShutDown),
            _ => Ok(()),
        }
    }

    fn shutdown(&mut self) -> Result<(), ControlError> {
        self.runtime.shutdown(self.clock);
        Ok(())
    }
}

pub struct Session {
    executor: CommandExecutor<Bench>,
    transcript: TranscriptLogger,
    next_event: EventId,
}

impl Session {
    /// Starts a session that records its transcript under `transcripts/`.
    pub fn new(profile: TranscriptProfile, config: ControllerConfig) -> io::Result<Self> {
        let transcript = TranscriptLogger::create(profile)?;
        Ok(Self::with_transcript(transcript, config))
    }

    /// Starts a session whose transcript is discarded.
    pub fn detached(config: ControllerConfig) -> Self {
        Self::with_transcript(TranscriptLogger::discard(), config)
    }

    fn with_transcript(transcript: TranscriptLogger, config: ControllerConfig) -> Self {
        Self {
            executor: CommandExecutor::new(Bench::new(config)),
            transcript,
            next_event: 0,
        }
    }

    pub fn bench(&self) -> &Bench {
        self.executor.control()
    }

    pub fn handle_command(&mut self, line: &str) -> io::Result<Vec<String>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        let elapsed = self.bench().clock();
        self.transcript
            .append_line(elapsed, TranscriptRole::Host, trimmed)?;

        let mut lines = match self.handle_bench_command(trimmed) {
            Some(lines) => lines,
            None => self.handle_console_command(trimmed),
        };
        lines.extend(self.new_events());

        self.record_output(elapsed, &lines)?;
        Ok(lines)
    }

    /// Advances to wall-clock `elapsed` and returns what happened, for `--live`.
    pub fn sync_to(&mut self, elapsed: Duration) -> io::Result<Vec<String>> {
        let reports = self.executor.control_mut().advance_to(elapsed);
        let mut lines: Vec<String> = reports
            .iter()
            .map(|(at, report)| describe_tick(*at, report))
            .collect();
        lines.extend(self.new_events());
        self.record_output(elapsed, &lines)?;
        Ok(lines)
    }

    /// Feeds a raw button edge at the current clock, for `--live`.
    pub fn press(&mut self, button: Button) -> io::Result<Vec<String>> {
        let elapsed = self.bench().clock();
        self.transcript
            .append_line(elapsed, TranscriptRole::Host, &format!("[key] {button}"))?;
        let outcome = self.executor.control_mut().press(button);
        let mut lines = vec![describe_edge(button, outcome)];
        lines.extend(self.new_events());
        self.record_output(elapsed, &lines)?;
        Ok(lines)
    }

    fn handle_bench_command(&mut self, line: &str) -> Option<Vec<String>> {
        let mut words = line.split_whitespace();
        let command = words.next()?.to_ascii_lowercase();
        let argument = words.next();
        let extra = words.next();

        let lines = match (command.as_str(), argument, extra) {
            ("advance", Some(value), None) => match value.parse::<u64>() {
                Ok(millis) => {
                    let bench = self.executor.control_mut();
                    let target = bench.clock() + Duration::from_millis(millis);
                    let mut lines = describe_ticks(&bench.advance_to(target));
                    lines.push(format!("clock {}", format_clock(target)));
                    lines
                }
                Err(_) => vec![format!("ERR syntax bad duration `{value}`")],
            },
            ("advance", ..) => vec!["ERR syntax usage: advance <ms>".to_string()],
            ("tick", argument, None) => {
                match argument.map_or(Ok(1), str::parse::<u32>) {
                    Ok(count) if (1..=MAX_TICKS_PER_COMMAND).contains(&count) => {
                        let reports = self.executor.control_mut().run_ticks(count);
                        if reports.is_empty() {
                            vec!["no tick scheduled".to_string()]
                        } else {
                            describe_ticks(&reports)
                        }
                    }
                    _ => vec![format!(
                        "ERR syntax tick count must be 1-{MAX_TICKS_PER_COMMAND}"
                    )],
                }
            }
            ("tick", ..) => vec!["ERR syntax usage: tick [n]".to_string()],
            ("press", Some(label), None) => match Button::from_label(label) {
                Some(button) => {
                    let outcome = self.executor.control_mut().press(button);
                    vec![describe_edge(button, outcome)]
                }
                None => vec![format!("ERR syntax unknown button `{label}`")],
            },
            ("press", ..) => vec!["ERR syntax usage: press toggle|ped".to_string()],
            ("events", None, None) => self.dump_events(),
            ("help", None, None) => {
                let mut out = String::new();
                if self.executor.execute(line, &mut out).is_err() {
                    return None;
                }
                let mut lines: Vec<String> = out.lines().map(str::to_string).collect();
                lines.extend(BENCH_HELP.iter().map(|(_, summary)| (*summary).to_string()));
                lines
            }
            ("help", Some(topic), None) => {
                let (_, summary) = BENCH_HELP
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(topic))?;
                vec![(*summary).to_string()]
            }
            _ => return None,
        };
        Some(lines)
    }

    fn handle_console_command(&mut self, line: &str) -> Vec<String> {
        let mut out = String::new();
        match self.executor.execute(line, &mut out) {
            Ok(CommandOutcome::ShutDown) => {
                let mut lines: Vec<String> = out.lines().map(str::to_string).collect();
                lines.push(format!(
                    "lights {}",
                    self.bench().runtime().driver().state()
                ));
                lines
            }
            Ok(_) => out.lines().map(str::to_string).collect(),
            Err(CommandError::Parse(err)) => vec![format!("ERR syntax {err}")],
            Err(CommandError::Control(err)) => vec![format!("ERR {err}")],
            Err(CommandError::Output) => vec!["ERR output".to_string()],
        }
    }

    fn dump_events(&self) -> Vec<String> {
        let telemetry = self.bench().runtime().telemetry();
        if telemetry.is_empty() {
            return vec!["no events".to_string()];
        }
        telemetry
            .oldest_first()
            .map(|record| format!("{} t={}", record, format_clock(record.timestamp)))
            .collect()
    }

    fn new_events(&mut self) -> Vec<String> {
        let telemetry = self.executor.control().runtime().telemetry();
        let lines = telemetry
            .since(self.next_event)
            .iter()
            .map(|record| format!("event {} t={}", record, format_clock(record.timestamp)))
            .collect();
        self.next_event = telemetry.next_id();
        lines
    }

    fn record_output(&mut self, elapsed: Duration, lines: &[String]) -> io::Result<()> {
        for line in lines {
            self.transcript
                .append_line(elapsed, TranscriptRole::Emulator, line)?;
        }
        Ok(())
    }
}

fn describe_ticks(reports: &[(Duration, TickReport)]) -> Vec<String> {
    reports
        .iter()
        .map(|(at, report)| describe_tick(*at, report))
        .collect()
}

fn describe_tick(at: Duration, report: &TickReport) -> String {
    let mut line = format!(
        "{} {} n={} {}",
        format_clock(at),
        report.mode,
        report.cycle_count,
        report.lights
    );
    match report.crossing {
        Some(CrossingEvent::Started) => line.push_str(" [crossing started]"),
        Some(CrossingEvent::Progress { elapsed }) => {
            line.push_str(&format!(" [crossing {elapsed}]"));
        }
        Some(CrossingEvent::Complete) => line.push_str(" [crossing complete]"),
        None => {}
    }
    line
}

fn describe_edge(button: Button, outcome: EdgeOutcome) -> String {
    match outcome {
        EdgeOutcome::Debounced => format!("{button}: bounced"),
        EdgeOutcome::Toggle(outcome) => format!("{button}: {outcome:?}"),
        EdgeOutcome::Call(outcome) => format!("{button}: {outcome:?}"),
        EdgeOutcome::Inactive => format!("{button}: controller shut down"),
    }
}

fn format_clock(at: Duration) -> String {
    format!("+{}ms", at.as_millis())
}

struct TranscriptLogger {
    writer: Box<dyn Write>,
}

impl TranscriptLogger {
    fn create(profile: TranscriptProfile) -> io::Result<Self> {
        let path = Path::new(profile.log_path());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut logger = Self {
            writer: Box::new(BufWriter::new(file)),
        };

        logger.write_header(profile)?;
        Ok(logger)
    }

    fn discard() -> Self {
        Self {
            writer: Box::new(io::sink()),
        }
    }

    fn write_header(&mut self, profile: TranscriptProfile) -> io::Result<()> {
        writeln!(self.writer, "# {}", profile.header())?;
        writeln!(
            self.writer,
            "# Timestamps are milliseconds of simulated time since start"
        )?;
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn append_line(
        &mut self,
        elapsed: Duration,
        role: TranscriptRole,
        line: &str,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "[+{:>6} ms] {} {}",
            elapsed.as_millis(),
            role.prefix(),
            line
        )?;
        self.writer.flush()
    }
}

enum TranscriptRole {
    Host,
    Emulator,
}

impl TranscriptRole {
    fn prefix(&self) -> &'static str {
        match self {
            TranscriptRole::Host => "HOST>",
            TranscriptRole::Emulator => "EMU <",
        }
    }
}
