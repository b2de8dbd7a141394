//! In-process content store.
//!
//! Behaves like the remote store for a single file: every write produces a new
//! version token and conditional writes with a stale token are refused. It can
//! also simulate another process writing between a read and the next write.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::codec::encode_log;
use super::store::{ContentStore, PutFileRequest, RemoteFile, VersionToken, WriteOutcome};
use super::{SyncError, SyncResult};
use crate::models::SuggestionLog;

#[derive(Debug)]
pub struct MemoryContentStore {
    path: String,
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    file: Option<StoredFile>,
    revision: u64,
    pending_concurrent_write: Option<String>,
    access_denied: bool,
    writes: Vec<PutFileRequest>,
}

#[derive(Debug, Clone)]
struct StoredFile {
    encoded_content: String,
    version: VersionToken,
}

impl MemoryState {
    fn store(&mut self, encoded_content: String) {
        self.revision += 1;
        let mut hasher = DefaultHasher::new();
        encoded_content.hash(&mut hasher);
        self.revision.hash(&mut hasher);
        self.file = Some(StoredFile {
            encoded_content,
            version: VersionToken::new(format!("{:016x}", hasher.finish())),
        });
    }
}

impl MemoryContentStore {
    /// Empty store; the file does not exist yet
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(MemoryState::default()),
        }
    }

    /// Store whose file already holds `encoded_content` verbatim
    pub fn with_content(path: impl Into<String>, encoded_content: impl Into<String>) -> Self {
        let store = Self::new(path);
        store.lock().store(encoded_content.into());
        store
    }

    /// Store whose file already holds `log`
    pub fn with_log(path: impl Into<String>, log: &SuggestionLog) -> SyncResult<Self> {
        Ok(Self::with_content(path, encode_log(log)?))
    }

    /// Current transport content, `None` while the file does not exist
    pub fn encoded_content(&self) -> Option<String> {
        self.lock()
            .file
            .as_ref()
            .map(|file| file.encoded_content.clone())
    }

    /// Current version token, `None` while the file does not exist
    pub fn version(&self) -> Option<VersionToken> {
        self.lock().file.as_ref().map(|file| file.version.clone())
    }

    /// Overwrite the file just before the next `put_file` is evaluated
    pub fn write_before_next_put(&self, encoded_content: impl Into<String>) {
        self.lock().pending_concurrent_write = Some(encoded_content.into());
    }

    /// Refuse every request as if the credential lacked access
    pub fn deny_access(&self, denied: bool) {
        self.lock().access_denied = denied;
    }

    /// Every write request received, accepted or not
    pub fn writes(&self) -> Vec<PutFileRequest> {
        self.lock().writes.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ContentStore for MemoryContentStore {
    fn path(&self) -> &str {
        &self.path
    }

    async fn get_file(&self) -> SyncResult<Option<RemoteFile>> {
        let state = self.lock();
        if state.access_denied {
            return Err(SyncError::Unauthorized(format!("read of {} denied", self.path)));
        }

        Ok(state.file.as_ref().map(|file| RemoteFile {
            path: self.path.clone(),
            encoded_content: file.encoded_content.clone(),
            version: file.version.clone(),
        }))
    }

    async fn put_file(&self, request: PutFileRequest) -> SyncResult<WriteOutcome> {
        let mut state = self.lock();
        state.writes.push(request.clone());

        if state.access_denied {
            return Err(SyncError::Unauthorized(format!("write of {} denied", self.path)));
        }
        if let Some(concurrent) = state.pending_concurrent_write.take() {
            state.store(concurrent);
        }

        let current = state.file.as_ref().map(|file| file.version.clone());
        let outcome = match (current, request.version) {
            (None, None) => WriteOutcome::Created,
            (Some(current), Some(expected)) if current == expected => WriteOutcome::Updated,
            (Some(current), Some(expected)) => {
                return Err(SyncError::Conflict(format!(
                    "{} is at {current}, not {expected}",
                    self.path
                )));
            }
            (Some(current), None) => {
                return Err(SyncError::Conflict(format!(
                    "{} already exists at {current}",
                    self.path
                )));
            }
            (None, Some(expected)) => {
                return Err(SyncError::Conflict(format!(
                    "{} no longer exists (expected {expected})",
                    self.path
                )));
            }
        };

        state.store(request.encoded_content);
        Ok(outcome)
    }
}
