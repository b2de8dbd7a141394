use std::io;

use herbs_core::config::{ConfigError, ENV_NAME_COLUMN, ENV_TABLE, ENV_TOKEN};
use herbs_core::sync::SyncError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] herbs_core::Error),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Herb name cannot be empty")]
    EmptyHerbName,
    #[error("No suggestion text provided")]
    EmptySuggestion,
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Could not resolve a data directory; pass --db-path or set HERBS_DB_PATH")]
    NoDataDir,
}

impl CliError {
    /// Follow-up advice printed under the error message
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::Config(ConfigError::MissingVar(name)) if *name == ENV_TOKEN => Some(format!(
                "Set {ENV_TOKEN} (environment or .env) to a token that can write repository contents."
            )),
            Self::Sync(SyncError::Unauthorized(_)) => Some(format!(
                "Check that {ENV_TOKEN} is valid and has contents read/write access to the repository."
            )),
            Self::Sync(SyncError::Conflict(_)) => Some(
                "Another submission landed first; nothing was saved. Run the command again to retry."
                    .to_string(),
            ),
            Self::Sync(SyncError::Transient(_)) => Some(
                "Nothing was saved. Check the network connection and run the command again."
                    .to_string(),
            ),
            Self::Core(herbs_core::Error::SchemaMismatch(_)) => Some(format!(
                "Set {ENV_TABLE} and {ENV_NAME_COLUMN} to match the reference database."
            )),
            _ => None,
        }
    }
}
