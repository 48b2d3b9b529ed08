//! Homework Core
//!
//! Core types and pure logic for the homework status bot.
//!
//! This crate contains:
//! - Domain types: verdicts, homework records and status snapshots
//! - Validation: shape checks for decoded API responses
//! - Messages: turning a homework record into a notification text
//! - Tracker: last-sent state used to suppress repeated notifications
//!
//! Nothing here performs I/O. HTTP lives in `homework-client`, the loop
//! in `homework-bot`.

pub mod domain;
pub mod message;
pub mod tracker;
pub mod validation;

pub use domain::homework::{HomeworkRecord, StatusSnapshot, Verdict};
pub use message::{ParseError, StatusUpdate, parse_status};
pub use tracker::{ChangeTracker, Subject};
pub use validation::{ShapeError, check_response};
