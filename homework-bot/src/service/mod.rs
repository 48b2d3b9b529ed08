//! Service layer
//!
//! Services deliver the bot's output. They are trait-based so the polling
//! loop can be tested without a messaging backend.

mod notifier;

pub use notifier::{Notifier, TelegramNotifier, deliver};
