//! Service layer for the watcher.
//!
//! - Source extraction (`SourceAdapter`)
//! - Digest delivery (`Notifier`, `TelegramNotifier`)

mod notifier;
mod sources;

pub use notifier::{Digest, DigestSection, DeliveryOutcome, Notifier, TelegramNotifier};
pub use sources::{SourceAdapter, parse_items};
