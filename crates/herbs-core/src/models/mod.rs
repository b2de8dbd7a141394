//! Data models for Herbs

mod herb;
mod suggestion;

pub use herb::HerbRecord;
pub use suggestion::{Suggestion, SuggestionLog, SUBMITTED_AT_FORMAT};
