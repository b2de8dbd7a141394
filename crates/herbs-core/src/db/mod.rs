//! Read-only reference database for Herbs

mod connection;
mod repository;

pub use connection::HerbDatabase;
pub use repository::{HerbRepository, SqliteHerbRepository};
