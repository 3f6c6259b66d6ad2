//! Parser for operator console lines.
//!
//! Keywords are matched case-insensitively and must be followed by whitespace
//! or the end of the line. A line that starts with a digit is treated as a
//! rate write, which keeps the console compatible with simply echoing a number
//! at the device.

use core::fmt;

use winnow::ascii::{Caseless, digit1, space0, space1};
use winnow::combinator::{alt, eof, peek, terminated};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::rest;

/// Parsed console command borrowing from the input line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConsoleCommand<'a> {
    Status,
    /// Rate write; `None` asks for the current rate.
    Rate(Option<&'a str>),
    Toggle,
    Call,
    Shutdown,
    Help(Option<&'a str>),
}

/// Errors produced while assembling or parsing a console line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConsoleError {
    /// The line held only whitespace.
    Empty,
    /// The line did not start with a known command.
    Syntax,
    /// A command that takes no argument was given one.
    UnexpectedArgument,
    /// Input exceeded the line buffer before a terminator arrived.
    LineOverflow,
    /// The line was not valid UTF-8.
    InvalidUtf8,
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::Empty => f.write_str("empty line"),
            ConsoleError::Syntax => f.write_str("unknown command"),
            ConsoleError::UnexpectedArgument => f.write_str("command takes no arguments"),
            ConsoleError::LineOverflow => f.write_str("line too long"),
            ConsoleError::InvalidUtf8 => f.write_str("invalid utf-8"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Keyword {
    Status,
    Rate,
    BareRate,
    Toggle,
    Call,
    Shutdown,
    Help,
}

/// Parses one console line (without its terminator).
///
/// # Errors
///
/// Returns [`ConsoleError::Empty`] for blank lines, [`ConsoleError::Syntax`]
/// for unknown commands and [`ConsoleError::UnexpectedArgument`] when a
/// command that takes no argument is given one.
pub fn parse(line: &str) -> Result<ConsoleCommand<'_>, ConsoleError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ConsoleError::Empty);
    }

    let (keyword, argument) = intent.parse(trimmed).map_err(|_| ConsoleError::Syntax)?;
    let argument = (!argument.is_empty()).then_some(argument);

    match keyword {
        Keyword::Rate => Ok(ConsoleCommand::Rate(argument)),
        Keyword::BareRate => Ok(ConsoleCommand::Rate(Some(trimmed))),
        Keyword::Help => Ok(ConsoleCommand::Help(argument)),
        Keyword::Status | Keyword::Toggle | Keyword::Call | Keyword::Shutdown
            if argument.is_some() =>
        {
            Err(ConsoleError::UnexpectedArgument)
        }
        Keyword::Status => Ok(ConsoleCommand::Status),
        Keyword::Toggle => Ok(ConsoleCommand::Toggle),
        Keyword::Call => Ok(ConsoleCommand::Call),
        Keyword::Shutdown => Ok(ConsoleCommand::Shutdown),
    }
}

fn intent<'a>(input: &mut &'a str) -> Result<(Keyword, &'a str), ContextError> {
    let keyword = alt((
        word("status").value(Keyword::Status),
        word("rate").value(Keyword::Rate),
        word("toggle").value(Keyword::Toggle),
        word("call").value(Keyword::Call),
        word("shutdown").value(Keyword::Shutdown),
        word("help").value(Keyword::Help),
        peek(digit1).value(Keyword::BareRate),
    ))
    .parse_next(input)?;

    space0.parse_next(input)?;
    let remainder = rest.parse_next(input)?;
    Ok((keyword, remainder))
}

fn word<'a>(keyword: &'static str) -> impl Parser<&'a str, &'a str, ContextError> {
    terminated(Caseless(keyword), peek(alt((space1, eof))))
}
