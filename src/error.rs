//! Error types for queue operations

use std::{path::PathBuf, process::ExitStatus};

use thiserror::Error;

/// Errors that end an operator session.
///
/// Operator typing mistakes never show up here; the menus recover from
/// those on their own. Everything in this enum is fatal and is reported by
/// the binary before it exits.
#[derive(Debug, Error)]
pub enum Error {
    /// A queue tool could not be located
    #[error("Unable to locate `{tool}`: {reason}")]
    ToolNotFound { tool: &'static str, reason: String },

    /// A queue tool could not be started or exited unsuccessfully
    #[error("`{tool}` failed ({status}){}", fmt_output(.output))]
    ToolExecutionFailed {
        tool: &'static str,
        status: String,
        output: String,
    },

    /// A record in the queue listing is not valid
    #[error("Malformed queue record on line {line}: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A record in the queue listing has no recipients to display
    #[error("Queue record {queue_id} on line {line} has no recipients")]
    MissingRecipients { line: usize, queue_id: String },

    /// There is nothing to choose from
    #[error("There are no items to choose from")]
    EmptyInput,

    /// The chosen action has no external operation behind it
    #[error("Action `{0}` does not run a queue tool")]
    NothingToDispatch(&'static str),

    /// The configuration file could not be read or parsed
    #[error("Invalid configuration {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    /// I/O error on the interactive streams
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn execution_failed(
        tool: &'static str,
        status: Option<ExitStatus>,
        output: String,
    ) -> Self {
        Self::ToolExecutionFailed {
            tool,
            status: status.map_or_else(|| "not started".to_string(), |s| s.to_string()),
            output,
        }
    }
}

fn fmt_output(output: &str) -> String {
    let output = output.trim();
    if output.is_empty() {
        String::new()
    } else {
        format!(":\n{output}")
    }
}

/// Result type for queue operations
pub type Result<T> = std::result::Result<T, Error>;
