//! Scripted stand-in for the Postfix tools

use std::{cell::RefCell, collections::VecDeque};

use postqctl::{Action, Error, QueueBackend, Result};

/// Serves queued listings in order and records every dispatched action.
///
/// Once the scripted listings run out the queue reads as empty.
#[derive(Default)]
pub struct ScriptedQueue {
    listings: RefCell<VecDeque<String>>,
    dispatched: RefCell<Vec<(Action, String)>>,
    fail_dispatch: bool,
    pub list_calls: RefCell<usize>,
}

impl ScriptedQueue {
    pub fn new<I, S>(listings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            listings: RefCell::new(listings.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing_dispatch(mut self) -> Self {
        self.fail_dispatch = true;
        self
    }

    pub fn dispatched(&self) -> Vec<(Action, String)> {
        self.dispatched.borrow().clone()
    }
}

impl QueueBackend for ScriptedQueue {
    fn list(&self) -> Result<String> {
        *self.list_calls.borrow_mut() += 1;
        Ok(self.listings.borrow_mut().pop_front().unwrap_or_default())
    }

    fn dispatch(&self, action: Action, queue_id: &str) -> Result<String> {
        self.dispatched
            .borrow_mut()
            .push((action, queue_id.to_string()));

        if self.fail_dispatch {
            return Err(Error::ToolExecutionFailed {
                tool: "postsuper",
                status: "exit status: 1".to_string(),
                output: format!("postsuper: fatal: {queue_id}: no such message"),
            });
        }

        Ok(format!("postsuper: {queue_id}: {}", action.label().to_lowercase()))
    }
}

/// One listing line with a single recipient
pub fn record(queue: &str, id: &str, arrival: &str, address: &str, reason: &str) -> String {
    format!(
        r#"{{"queue_name":"{queue}","queue_id":"{id}","arrival_time":"{arrival}","message_size":1024,"sender":"sender@example.org","recipients":[{{"address":"{address}","delay_reason":"{reason}"}}]}}"#
    )
}
