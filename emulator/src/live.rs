//! Real-time mode: the simulated clock follows the wall clock and keys act as
//! the two push buttons.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use controller_core::debounce::Button;

use crate::session::Session;

/// Longest wait for a key before the clock is synced again.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

const KEY_HELP: &str = "keys: [t] toggle  [p] pedestrian  [1-9] rate  [s] status  [x] shutdown  [q] quit";

enum Action {
    Press(Button),
    Command(String),
    Quit,
}

pub fn run(mut session: Session) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    let result = event_loop(&mut session);
    terminal::disable_raw_mode()?;
    result
}

fn event_loop(session: &mut Session) -> io::Result<()> {
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    write_lines(&mut writer, &[KEY_HELP.to_string()])?;

    let started = Instant::now();
    loop {
        let lines = session.sync_to(started.elapsed())?;
        write_lines(&mut writer, &lines)?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };

        // Catch up first so the edge is stamped after every tick already due.
        let lines = session.sync_to(started.elapsed())?;
        write_lines(&mut writer, &lines)?;

        let lines = match map_key(key) {
            Some(Action::Press(button)) => session.press(button)?,
            Some(Action::Command(command)) => session.handle_command(&command)?,
            Some(Action::Quit) => break,
            None => continue,
        };
        write_lines(&mut writer, &lines)?;
    }

    write_lines(&mut writer, &["Session closed.".to_string()])
}

fn map_key(key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('t' | 'T') => Some(Action::Press(Button::Toggle)),
        KeyCode::Char('p' | 'P') => Some(Action::Press(Button::Pedestrian)),
        KeyCode::Char(digit @ '1'..='9') => Some(Action::Command(format!("rate {digit}"))),
        KeyCode::Char('s' | 'S') => Some(Action::Command("status".to_string())),
        KeyCode::Char('x' | 'X') => Some(Action::Command("shutdown".to_string())),
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Some(Action::Quit),
        _ => None,
    }
}

/// Raw mode disables output post-processing, so every line ends in CRLF.
fn write_lines<W: Write>(writer: &mut W, lines: &[String]) -> io::Result<()> {
    for line in lines {
        write!(writer, "{line}\r\n")?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_map_to_buttons_and_commands() {
        assert!(matches!(
            map_key(press(KeyCode::Char('t'))),
            Some(Action::Press(Button::Toggle))
        ));
        assert!(matches!(
            map_key(press(KeyCode::Char('P'))),
            Some(Action::Press(Button::Pedestrian))
        ));
        assert!(matches!(
            map_key(press(KeyCode::Char('7'))),
            Some(Action::Command(command)) if command == "rate 7"
        ));
        assert!(matches!(map_key(press(KeyCode::Esc)), Some(Action::Quit)));
        assert!(map_key(press(KeyCode::Char('0'))).is_none());
    }

    #[test]
    fn ctrl_c_quits() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(matches!(map_key(key), Some(Action::Quit)));
    }

    #[test]
    fn lines_end_with_crlf() {
        let mut out = Vec::new();
        write_lines(&mut out, &["a".to_string(), "b".to_string()]).unwrap();
        assert_eq!(out, b"a\r\nb\r\n");
    }
}
