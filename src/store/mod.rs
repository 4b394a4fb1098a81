//! libSQL-backed subscriber storage.

pub mod migrations;
pub mod recipients;

pub use recipients::{AddOutcome, RecipientStore, normalize_email};
