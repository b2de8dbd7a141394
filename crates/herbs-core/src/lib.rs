//! herbs-core - Core library for Herbs
//!
//! This crate contains the shared models, the read-only reference lookup, and
//! the remote suggestion-log synchronizer used by the Herbs interfaces.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod sync;
pub mod util;

pub use config::SuggestionLogConfig;
pub use error::{Error, Result};
pub use models::{HerbRecord, Suggestion, SuggestionLog};
