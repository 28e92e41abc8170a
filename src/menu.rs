//! Numbered menus on a line-oriented terminal.
//!
//! Two flavours share the same answer parsing but recover from bad input
//! differently:
//!
//! - [`Prompter::select_message`] never gives up. Input that is not a number
//!   redraws the whole list, a number past the end only repeats the prompt.
//! - [`Prompter::choose`] asks exactly once and reports anything unusable as
//!   [`Selection::Invalid`], leaving recovery to the caller.
//!
//! The operator sees both behaviours, so they are kept apart on purpose.

use std::{
    fmt::Display,
    io::{BufRead, ErrorKind, Write},
};

use tracing::debug;

use crate::{
    error::{Error, Result},
    message::MessageSet,
};

/// Outcome of a single-shot menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Zero-based index of the chosen item
    Chosen(usize),
    /// The operator entered `0`
    Cancelled,
    /// Anything that is not a number in range
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Answer {
    Number(u64),
    Malformed,
    Closed,
}

/// Owns the operator's input and output streams
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub const fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    /// Let the operator pick one message.
    ///
    /// Returns `None` when the operator enters `0` or input is exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] without prompting when `messages` is
    /// empty, and [`Error::Io`] when the terminal itself fails.
    pub fn select_message(&mut self, messages: &MessageSet) -> Result<Option<usize>> {
        if messages.is_empty() {
            return Err(Error::EmptyInput);
        }

        let count = messages.len();

        loop {
            for (k, message) in messages.iter().enumerate() {
                writeln!(self.output, "{:4}  {}", k + 1, message.summary())?;
            }

            loop {
                writeln!(
                    self.output,
                    "Select a message by entering a number from 1 to {count}. Enter 0 to cancel."
                )?;
                self.output.flush()?;

                match self.read_answer()? {
                    // Redrawing on a closed stream would never end, so treat it as a cancel
                    Answer::Closed | Answer::Number(0) => return Ok(None),
                    Answer::Number(n) => match usize::try_from(n) {
                        Ok(n) if n <= count => return Ok(Some(n - 1)),
                        _ => debug!(answer = n, count, "Message number out of range"),
                    },
                    Answer::Malformed => break,
                }
            }
        }
    }

    /// Show `items` and ask once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] without prompting when `items` is empty,
    /// and [`Error::Io`] when the terminal itself fails.
    pub fn choose<T: Display>(&mut self, prompt: &str, items: &[T]) -> Result<Selection> {
        if items.is_empty() {
            return Err(Error::EmptyInput);
        }

        for (k, item) in items.iter().enumerate() {
            writeln!(self.output, "{:3}\t{item}", k + 1)?;
        }
        write!(self.output, "{prompt} ")?;
        self.output.flush()?;

        let selection = match self.read_answer()? {
            Answer::Number(0) => Selection::Cancelled,
            Answer::Number(n) => usize::try_from(n)
                .ok()
                .filter(|n| *n <= items.len())
                .map_or(Selection::Invalid, |n| Selection::Chosen(n - 1)),
            Answer::Malformed | Answer::Closed => Selection::Invalid,
        };

        if selection == Selection::Invalid {
            debug!(count = items.len(), "Unusable menu answer");
        }

        Ok(selection)
    }

    fn read_answer(&mut self) -> Result<Answer> {
        let mut line = String::new();

        match self.input.read_line(&mut line) {
            Ok(0) => Ok(Answer::Closed),
            Ok(_) => Ok(parse_answer(&line)),
            // The offending bytes are consumed, so asking again is safe
            Err(e) if e.kind() == ErrorKind::InvalidData => Ok(Answer::Malformed),
            Err(e) => Err(e.into()),
        }
    }
}

fn parse_answer(line: &str) -> Answer {
    let line = line.trim();
    if line.is_empty() || !line.bytes().all(|b| b.is_ascii_digit()) {
        return Answer::Malformed;
    }

    line.parse().map_or(Answer::Malformed, Answer::Number)
}
