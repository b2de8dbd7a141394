pub mod common;
pub mod completions;
pub mod search;
pub mod suggest;
pub mod suggestions;
