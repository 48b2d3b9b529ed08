//! Core domain types
//!
//! This module contains the domain structures shared between the client
//! (which fetches raw snapshots) and the bot (which turns them into
//! notifications).

pub mod homework;
