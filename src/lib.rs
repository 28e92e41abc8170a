//! Interactive console for inspecting and acting on the Postfix queue.

pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod menu;
pub mod message;
pub mod session;
pub mod snapshot;
pub mod tools;

pub use config::{Config, ToolPaths};
pub use error::{Error, Result};
pub use message::{ArrivalTime, Message, MessageSet, QueueName, Recipient};
pub use session::{Outcome, Session};
pub use tools::{Action, PostfixTools, QueueBackend, Tool};
pub use tracing;
