//! Remote suggestion-log synchronization.
//!
//! The log is one JSON array stored as a single file in a remote content
//! store. Appending is a read-modify-write guarded only by the store's
//! conditional write: the version token observed by the read must still be
//! current when the write lands, otherwise the write is refused and surfaced
//! as [`SyncError::Conflict`]. Nothing here retries automatically.

pub mod codec;
mod github;
#[cfg(any(test, feature = "test-util"))]
mod memory;
mod store;

use std::fmt;

use thiserror::Error;

use crate::models::{Suggestion, SuggestionLog};

pub use github::GitHubContentStore;
#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryContentStore;
pub use store::{ContentStore, PutFileRequest, RemoteFile, VersionToken, WriteOutcome};

#[derive(Debug, Error)]
pub enum SyncError {
    /// The credential cannot read or write the log; fix its scope
    #[error("Access to the suggestion log was denied: {0}")]
    Unauthorized(String),
    /// The log changed between read and write; re-run the whole append
    #[error("Suggestion log changed since it was read: {0}")]
    Conflict(String),
    /// Network failure, timeout or temporary server error
    #[error("Suggestion log is temporarily unreachable: {0}")]
    Transient(String),
    /// Remote content or response cannot be decoded
    #[error("Suggestion log content is malformed: {0}")]
    Malformed(String),
    /// Any other refusal by the store
    #[error("Suggestion log store rejected the request: {message} (HTTP {status})")]
    Rejected { status: u16, message: String },
    #[error("Invalid suggestion log configuration: {0}")]
    InvalidConfiguration(String),
}

pub type SyncResult<T> = Result<T, SyncError>;

impl SyncError {
    /// Whether re-running the same operation from the top may succeed
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Transient(_))
    }

    /// Short stable label for logs and machine-readable output
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Conflict(_) => "conflict",
            Self::Transient(_) => "transient",
            Self::Malformed(_) => "malformed",
            Self::Rejected { .. } => "rejected",
            Self::InvalidConfiguration(_) => "invalid_configuration",
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Malformed(error.to_string())
        } else if error.is_builder() {
            Self::InvalidConfiguration(error.to_string())
        } else {
            Self::Transient(error.to_string())
        }
    }
}

/// Decoded log together with the version it was read at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLogHandle {
    pub path: String,
    pub log: SuggestionLog,
    /// `None` when the file does not exist yet
    pub version: Option<VersionToken>,
}

/// Result of a successful append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    pub write: WriteOutcome,
    /// Number of entries in the log after the append
    pub entries: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppendStage {
    Start,
    Fetched,
    Encoded,
    Submitted,
}

impl fmt::Display for AppendStage {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Start => "start",
            Self::Fetched => "fetched",
            Self::Encoded => "encoded",
            Self::Submitted => "submitted",
        };
        formatter.write_str(label)
    }
}

fn advance(stage: &mut AppendStage, next: AppendStage, path: &str) {
    tracing::debug!("Append to {path}: stage '{stage}' -> '{next}'");
    *stage = next;
}

/// Appends suggestions to the remote log held by a [`ContentStore`]
pub struct SuggestionLogSync<S> {
    store: S,
}

impl<S: ContentStore> SuggestionLogSync<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Read and decode the current log; a missing file is an empty log
    pub async fn fetch(&self) -> SyncResult<SuggestionLog> {
        Ok(self.fetch_handle().await?.log)
    }

    /// Read and decode the current log, keeping the version it was read at
    pub async fn fetch_handle(&self) -> SyncResult<RemoteLogHandle> {
        let Some(file) = self.store.get_file().await? else {
            tracing::info!(
                "Suggestion log {} does not exist yet; starting empty",
                self.store.path()
            );
            return Ok(RemoteLogHandle {
                path: self.store.path().to_string(),
                log: SuggestionLog::new(),
                version: None,
            });
        };

        let log = codec::decode_log(&file.encoded_content)?;
        tracing::debug!(
            "Fetched {} suggestions from {} at {}",
            log.len(),
            file.path,
            file.version
        );
        Ok(RemoteLogHandle {
            path: file.path,
            log,
            version: Some(file.version),
        })
    }

    /// Append one entry: fetch, push, encode, conditional write
    ///
    /// The entry must already be validated. On any error the remote log is left
    /// as the store last saw it; the caller decides whether to retry.
    pub async fn append(&self, entry: Suggestion) -> SyncResult<AppendOutcome> {
        let mut stage = AppendStage::Start;
        let result = self.run_append(entry, &mut stage).await;

        match &result {
            Ok(outcome) => tracing::info!(
                "Appended suggestion to {} ({:?}, {} entries)",
                self.store.path(),
                outcome.write,
                outcome.entries
            ),
            Err(error) => tracing::warn!(
                "Append to {} failed after stage '{}' ({}): {}",
                self.store.path(),
                stage,
                error.kind(),
                error
            ),
        }
        result
    }

    async fn run_append(
        &self,
        entry: Suggestion,
        stage: &mut AppendStage,
    ) -> SyncResult<AppendOutcome> {
        let RemoteLogHandle {
            path,
            mut log,
            version,
        } = self.fetch_handle().await?;
        advance(stage, AppendStage::Fetched, &path);

        let message = format!("Add suggestion: {}", entry.herb_name);
        log.push(entry);
        let encoded_content = codec::encode_log(&log)?;
        advance(stage, AppendStage::Encoded, &path);
        tracing::debug!(
            "Writing {} suggestions to {} (expected version: {:?})",
            log.len(),
            path,
            version
        );

        advance(stage, AppendStage::Submitted, &path);
        let write = self
            .store
            .put_file(PutFileRequest {
                message,
                encoded_content,
                version,
            })
            .await?;

        Ok(AppendOutcome {
            write,
            entries: log.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDateTime;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::SUBMITTED_AT_FORMAT;

    fn suggestion(herb: &str, text: &str, at: &str) -> Suggestion {
        Suggestion::with_timestamp(
            herb,
            text,
            NaiveDateTime::parse_from_str(at, SUBMITTED_AT_FORMAT).unwrap(),
        )
        .unwrap()
    }

    fn empty_sync() -> SuggestionLogSync<MemoryContentStore> {
        SuggestionLogSync::new(MemoryContentStore::new("pending.json"))
    }

    #[tokio::test(flavor = "current_thread")]
    async fn fetch_missing_file_is_empty_log() {
        let sync = empty_sync();
        let handle = sync.fetch_handle().await.unwrap();
        assert!(handle.log.is_empty());
        assert_eq!(handle.version, None);
        assert_eq!(handle.path, "pending.json");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn submitted_entry_is_fetched_back() {
        let sync = empty_sync();
        let entry = suggestion("当归", "补充功效", "2024-01-01 10:00:00");

        let outcome = sync.append(entry.clone()).await.unwrap();
        assert_eq!(
            outcome,
            AppendOutcome {
                write: WriteOutcome::Created,
                entries: 1
            }
        );

        let log = sync.fetch().await.unwrap();
        assert_eq!(log.entries(), &[entry]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn create_on_empty_omits_version() {
        let sync = empty_sync();
        sync.append(suggestion("当归", "补充功效", "2024-01-01 10:00:00"))
            .await
            .unwrap();

        let writes = sync.store().writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].version, None);
        assert_eq!(writes[0].message, "Add suggestion: 当归");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn appends_keep_submission_order() {
        let sync = empty_sync();
        let entries = (0..5)
            .map(|index| {
                suggestion(
                    &format!("药材{index}"),
                    &format!("建议{index}"),
                    &format!("2024-01-0{} 10:00:00", index + 1),
                )
            })
            .collect::<Vec<_>>();

        for (index, entry) in entries.iter().enumerate() {
            let outcome = sync.append(entry.clone()).await.unwrap();
            assert_eq!(outcome.entries, index + 1);
            let expected_write = if index == 0 {
                WriteOutcome::Created
            } else {
                WriteOutcome::Updated
            };
            assert_eq!(outcome.write, expected_write);
        }

        assert_eq!(sync.fetch().await.unwrap().into_entries(), entries);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn update_sends_version_from_read() {
        let existing = SuggestionLog::from(vec![suggestion("黄芪", "x", "2024-01-01 09:00:00")]);
        let store = MemoryContentStore::with_log("pending.json", &existing).unwrap();
        let version_before = store.version();
        let sync = SuggestionLogSync::new(store);

        sync.append(suggestion("当归", "补充功效", "2024-01-01 10:00:00"))
            .await
            .unwrap();

        let writes = sync.store().writes();
        assert_eq!(writes[0].version, version_before);
        assert_ne!(sync.store().version(), version_before);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn concurrent_write_surfaces_conflict_and_keeps_remote_log() {
        let existing = SuggestionLog::from(vec![suggestion("黄芪", "x", "2024-01-01 09:00:00")]);
        let store = MemoryContentStore::with_log("pending.json", &existing).unwrap();

        let other_writer = SuggestionLog::from(vec![
            suggestion("黄芪", "x", "2024-01-01 09:00:00"),
            suggestion("甘草", "other process", "2024-01-01 09:30:00"),
        ]);
        let other_content = codec::encode_log(&other_writer).unwrap();
        store.write_before_next_put(other_content.clone());
        let sync = SuggestionLogSync::new(store);

        let error = sync
            .append(suggestion("当归", "补充功效", "2024-01-01 10:00:00"))
            .await
            .unwrap_err();
        assert!(matches!(error, SyncError::Conflict(_)), "{error:?}");
        assert!(error.is_retryable());

        assert_eq!(sync.store().encoded_content(), Some(other_content));
        assert_eq!(sync.fetch().await.unwrap(), other_writer);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn file_created_by_other_writer_is_conflict() {
        let store = MemoryContentStore::new("pending.json");
        store.write_before_next_put(codec::encode_log(&SuggestionLog::new()).unwrap());
        let sync = SuggestionLogSync::new(store);

        let error = sync
            .append(suggestion("当归", "补充功效", "2024-01-01 10:00:00"))
            .await
            .unwrap_err();
        assert!(matches!(error, SyncError::Conflict(_)), "{error:?}");
        assert!(sync.fetch().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn retry_after_conflict_appends_on_top_of_other_writer() {
        let store = MemoryContentStore::new("pending.json");
        let other = SuggestionLog::from(vec![suggestion("甘草", "first", "2024-01-01 09:00:00")]);
        store.write_before_next_put(codec::encode_log(&other).unwrap());
        let sync = SuggestionLogSync::new(store);
        let entry = suggestion("当归", "补充功效", "2024-01-01 10:00:00");

        assert!(sync.append(entry.clone()).await.is_err());
        let outcome = sync.append(entry.clone()).await.unwrap();
        assert_eq!(outcome.write, WriteOutcome::Updated);

        let log = sync.fetch().await.unwrap();
        assert_eq!(log.entries(), &[other.entries()[0].clone(), entry]);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn malformed_remote_content_is_reported_and_not_overwritten() {
        let store = MemoryContentStore::with_content("pending.json", "eyJub3QiOiAiYW4gYXJyYXkifQ==");
        let sync = SuggestionLogSync::new(store);

        let error = sync.fetch().await.unwrap_err();
        assert!(matches!(error, SyncError::Malformed(_)), "{error:?}");

        let error = sync
            .append(suggestion("当归", "补充功效", "2024-01-01 10:00:00"))
            .await
            .unwrap_err();
        assert!(matches!(error, SyncError::Malformed(_)), "{error:?}");
        assert!(!error.is_retryable());
        assert!(sync.store().writes().is_empty());
        assert_eq!(
            sync.store().encoded_content().as_deref(),
            Some("eyJub3QiOiAiYW4gYXJyYXkifQ==")
        );
    }

    #[tokio::test(flavor = "current_thread")]
    async fn denied_access_is_unauthorized() {
        let sync = empty_sync();
        sync.store().deny_access(true);

        let error = sync.fetch().await.unwrap_err();
        assert!(matches!(error, SyncError::Unauthorized(_)), "{error:?}");
        assert!(!error.is_retryable());
        assert_eq!(error.kind(), "unauthorized");
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn append_traces_each_stage_at_debug() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        empty_sync()
            .append(suggestion("当归", "补充功效", "2024-01-01 10:00:00"))
            .await
            .unwrap();

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        for transition in [
            "stage 'start' -> 'fetched'",
            "stage 'fetched' -> 'encoded'",
            "stage 'encoded' -> 'submitted'",
        ] {
            assert!(output.contains(transition), "missing {transition}: {output}");
        }
    }

    #[test]
    fn retryable_kinds() {
        assert!(SyncError::Transient("timeout".into()).is_retryable());
        assert!(SyncError::Conflict("stale".into()).is_retryable());
        assert!(!SyncError::Malformed("bad".into()).is_retryable());
        assert!(!SyncError::Rejected {
            status: 418,
            message: "teapot".into()
        }
        .is_retryable());
    }
}
