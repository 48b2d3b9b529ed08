//! Repository layer
//!
//! Repositories abstract communication with the status API behind traits so
//! the polling loop can be driven by scripted data in tests.

mod statuses;

pub use statuses::{HttpStatusRepository, StatusRepository};
