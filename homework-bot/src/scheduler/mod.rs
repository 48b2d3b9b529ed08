//! Scheduler layer for the bot
//!
//! This layer runs the polling loop: fetch, validate, turn homework entries
//! into messages, and notify on change, once per retry period until
//! shutdown.

pub mod poller;

pub use poller::{CursorPolicy, PollError, RecordFailurePolicy, StatusPoller};
