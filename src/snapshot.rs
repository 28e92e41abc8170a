//! Decoding of queue listings into a [`MessageSet`].
//!
//! The listing tool prints one JSON object per line. A listing is decoded
//! all or nothing: the first bad line aborts the whole snapshot, so callers
//! never act on a partial view of the queue.

use std::str::FromStr;

use tracing::debug;

use crate::{
    error::{Error, Result},
    message::{Message, MessageSet},
    tools::QueueBackend,
};

/// Decode a complete listing.
///
/// # Errors
///
/// Returns [`Error::Decode`] for the first line that is not a valid record,
/// or [`Error::MissingRecipients`] for a record that lists no recipients.
pub fn decode(raw: &str) -> Result<MessageSet> {
    let mut messages = Vec::new();

    for (index, line) in raw.trim().split('\n').enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let message: Message =
            serde_json::from_str(line).map_err(|source| Error::Decode { line: line_no, source })?;

        if message.recipients.is_empty() {
            return Err(Error::MissingRecipients {
                line: line_no,
                queue_id: message.queue_id,
            });
        }

        messages.push(message);
    }

    Ok(MessageSet::new(messages))
}

impl FromStr for MessageSet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        decode(s)
    }
}

/// Take a fresh snapshot of the live queue.
///
/// # Errors
///
/// Propagates listing failures from the backend and decoding failures from
/// [`decode`].
pub fn fetch<B: QueueBackend + ?Sized>(backend: &B) -> Result<MessageSet> {
    let raw = backend.list()?;
    let messages = decode(&raw)?;
    debug!(count = messages.len(), "Fetched queue snapshot");
    Ok(messages)
}
