mod live;
mod session;

use std::env;
use std::io::{self, BufRead, Write};
use std::process;

use controller_core::config::{ControllerConfig, CrossingTogglePolicy};
use session::{Session, TranscriptProfile};

const USAGE: &str = "Usage: emulator [--live] [--policy <abort|defer|preserve>] [--profile <name>]";

struct Options {
    live: bool,
    profile: TranscriptProfile,
    config: ControllerConfig,
}

fn main() -> io::Result<()> {
    let options = parse_options(env::args().skip(1)).unwrap_or_else(|err| {
        eprintln!("{err}");
        eprintln!("{USAGE}");
        process::exit(2);
    });

    if options.live {
        let session = Session::new(TranscriptProfile::Live, options.config)?;
        return live::run(session);
    }

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    let mut session = Session::new(options.profile, options.config)?;
    let mut line = String::new();

    writeln!(
        writer,
        "Signal Controller Emulator ready (toggle policy: {}). Type `help` for commands or `exit` to quit.",
        options.config.toggle_policy.label()
    )?;

    loop {
        line.clear();
        write!(writer, "> ")?;
        writer.flush()?;

        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            writeln!(writer)?;
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if should_terminate(trimmed) {
            writeln!(writer, "Session closed.")?;
            break;
        }

        let responses = session.handle_command(trimmed)?;
        for response in responses {
            writeln!(writer, "{response}")?;
        }
    }

    Ok(())
}

fn should_terminate(input: &str) -> bool {
    input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit")
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
    let mut options = Options {
        live: false,
        profile: TranscriptProfile::Interactive,
        config: ControllerConfig::new(),
    };

    while let Some(arg) = args.next() {
        if arg == "--live" {
            options.live = true;
        } else if let Some(value) = arg.strip_prefix("--policy=") {
            options.config = options.config.with_toggle_policy(parse_policy(value)?);
        } else if arg == "--policy" {
            let value = args.next().ok_or("Expected value after --policy")?;
            options.config = options.config.with_toggle_policy(parse_policy(&value)?);
        } else if let Some(value) = arg.strip_prefix("--profile=") {
            options.profile = TranscriptProfile::from_tag(value)?;
        } else if arg == "--profile" {
            let value = args.next().ok_or("Expected value after --profile")?;
            options.profile = TranscriptProfile::from_tag(&value)?;
        } else {
            return Err(format!("Unknown argument `{arg}`"));
        }
    }

    Ok(options)
}

fn parse_policy(value: &str) -> Result<CrossingTogglePolicy, String> {
    CrossingTogglePolicy::from_label(value)
        .ok_or_else(|| format!("Unknown toggle policy `{value}`"))
}
