//! Transport encoding of the suggestion log: base64 over UTF-8 JSON.

use base64::prelude::{Engine as _, BASE64_STANDARD};

use super::{SyncError, SyncResult};
use crate::models::SuggestionLog;

/// Decode transport content into a log
///
/// ASCII whitespace is ignored because the contents API wraps base64 lines.
/// Any failure is `Malformed`; nothing is ever partially decoded.
pub fn decode_log(encoded: &str) -> SyncResult<SuggestionLog> {
    let compact = encoded
        .chars()
        .filter(|ch| !ch.is_ascii_whitespace())
        .collect::<String>();

    let bytes = BASE64_STANDARD
        .decode(compact.as_bytes())
        .map_err(|error| SyncError::Malformed(format!("content is not valid base64: {error}")))?;
    let text = String::from_utf8(bytes)
        .map_err(|error| SyncError::Malformed(format!("content is not valid UTF-8: {error}")))?;

    serde_json::from_str::<SuggestionLog>(&text).map_err(|error| {
        SyncError::Malformed(format!(
            "content is not a JSON array of suggestions: {error}"
        ))
    })
}

/// Encode a log as pretty-printed JSON (2-space indent, non-ASCII verbatim) in base64
pub fn encode_log(log: &SuggestionLog) -> SyncResult<String> {
    let json = serde_json::to_string_pretty(log).map_err(|error| {
        SyncError::Malformed(format!("failed to encode suggestion log: {error}"))
    })?;
    Ok(BASE64_STANDARD.encode(json.as_bytes()))
}
