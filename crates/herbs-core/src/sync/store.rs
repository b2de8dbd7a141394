//! Remote content store seam used by the suggestion-log synchronizer.

use std::fmt;

use super::SyncResult;

/// Opaque identifier of a remote file's current content state
///
/// For the GitHub contents API this is the blob `sha`. Tokens are only ever
/// compared for equality.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VersionToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "VersionToken({})", self.0)
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

/// A file as returned by the remote store, content still transport-encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    /// Base64 text exactly as served
    pub encoded_content: String,
    pub version: VersionToken,
}

/// Conditional write of a whole file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutFileRequest {
    /// Commit message recorded by the store
    pub message: String,
    /// Base64 text of the new content
    pub encoded_content: String,
    /// Version observed at read time; `None` asks the store to create the file
    pub version: Option<VersionToken>,
}

/// Acknowledged write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file did not exist and was created
    Created,
    /// The existing file was replaced
    Updated,
}

/// Single-file remote store with optimistic concurrency
///
/// The file location is fixed when the store is constructed.
#[allow(async_fn_in_trait)]
pub trait ContentStore {
    /// Path of the file inside the store
    fn path(&self) -> &str;

    /// Read the file; `Ok(None)` when it does not exist
    async fn get_file(&self) -> SyncResult<Option<RemoteFile>>;

    /// Write the file, succeeding only while `request.version` still matches
    async fn put_file(&self, request: PutFileRequest) -> SyncResult<WriteOutcome>;
}
