//! The operator's read-decide-act loop.
//!
//! ```text
//! FetchSnapshot -> SelectMessage -> ShowReasons -> SelectAction -> Dispatch -> ShowResult
//!       ^               |                              |                           |
//!       |               +-> Done (cancel/empty)        +-> Done (quit)             |
//!       +----------------------------------------------+ (bad answer)              |
//!       +--------------------------------------------------------------------------+
//! ```
//!
//! Every pass starts from a fresh snapshot because the previous action may
//! have changed the queue. Fatal errors are returned from [`Session::run`]
//! untouched; deciding to exit is left to the binary.

use std::io::{BufRead, Write};

use tracing::{debug, info};

use crate::{
    config::Config,
    error::{Error, Result},
    format,
    menu::{Prompter, Selection},
    message::{Message, MessageSet},
    snapshot,
    tools::{Action, QueueBackend},
};

/// How a session ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The operator cancelled message selection
    Cancelled,
    /// The operator chose the Quit action
    Quit,
    /// There was nothing in the queue
    EmptyQueue,
}

#[derive(Debug)]
enum State {
    FetchSnapshot,
    SelectMessage(MessageSet),
    ShowReasons(Message),
    SelectAction(Message),
    Dispatch(Message, Action),
    ShowResult(String),
    Done(Outcome),
}

pub struct Session<B, R, W> {
    backend: B,
    prompter: Prompter<R, W>,
    wrap_width: usize,
    indent: String,
}

impl<B: QueueBackend, R: BufRead, W: Write> Session<B, R, W> {
    pub fn new(backend: B, input: R, output: W, config: &Config) -> Self {
        Self {
            backend,
            prompter: Prompter::new(input, output),
            wrap_width: config.wrap_width,
            indent: config.indent.clone(),
        }
    }

    /// Run until the operator leaves or something fatal happens.
    ///
    /// # Errors
    ///
    /// Any failure to list, decode or act on the queue, and any failure of
    /// the terminal streams.
    pub fn run(&mut self) -> Result<Outcome> {
        let mut state = State::FetchSnapshot;

        loop {
            state = match self.step(state)? {
                State::Done(outcome) => {
                    info!(?outcome, "Session finished");
                    return Ok(outcome);
                }
                next => next,
            };
        }
    }

    pub fn into_inner(self) -> (B, R, W) {
        let (input, output) = self.prompter.into_inner();
        (self.backend, input, output)
    }

    fn step(&mut self, state: State) -> Result<State> {
        let next = match state {
            State::FetchSnapshot => State::SelectMessage(snapshot::fetch(&self.backend)?),

            State::SelectMessage(messages) => match self.prompter.select_message(&messages) {
                Ok(Some(index)) => messages
                    .take(index)
                    .map_or(State::FetchSnapshot, State::ShowReasons),
                Ok(None) => State::Done(Outcome::Cancelled),
                Err(Error::EmptyInput) => {
                    writeln!(self.prompter.output(), "There are no messages in the queue.")?;
                    State::Done(Outcome::EmptyQueue)
                }
                Err(e) => return Err(e),
            },

            State::ShowReasons(message) => {
                self.show_reasons(&message)?;
                State::SelectAction(message)
            }

            State::SelectAction(message) => {
                match self.prompter.choose("Select action:", &Action::ALL)? {
                    Selection::Chosen(index) => match Action::ALL[index] {
                        Action::Quit => State::Done(Outcome::Quit),
                        action => State::Dispatch(message, action),
                    },
                    Selection::Cancelled | Selection::Invalid => {
                        write!(self.prompter.output(), "\n\n")?;
                        State::FetchSnapshot
                    }
                }
            }

            State::Dispatch(message, action) => {
                debug!(queue_id = %message.queue_id, %action, "Running action");
                State::ShowResult(self.backend.dispatch(action, &message.queue_id)?)
            }

            State::ShowResult(output) => {
                writeln!(self.prompter.output(), "{output}")?;
                State::FetchSnapshot
            }

            State::Done(outcome) => State::Done(outcome),
        };

        Ok(next)
    }

    fn show_reasons(&mut self, message: &Message) -> Result<()> {
        let out = self.prompter.output();

        for recipient in &message.recipients {
            writeln!(out, "{}:", recipient.address)?;
            let lines = format::wrap(&recipient.delay_reason, self.wrap_width);
            writeln!(out, "{}\n", format::indent(&lines, &self.indent))?;
        }

        Ok(())
    }
}
