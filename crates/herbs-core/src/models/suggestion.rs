//! Suggestion model and the append-only suggestion log

use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Wire and display format of [`Suggestion::submitted_at`]
pub const SUBMITTED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One user-submitted improvement suggestion about a reference entry
///
/// Keys serialize with the names used by the deployed log (`药材名`,
/// `建议内容`, `提交时间`); the English field names are accepted when reading.
/// Keys this model does not know are kept in `extra` so re-encoding a log
/// never drops data written by other clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Herb the suggestion is about, as typed by the user
    #[serde(rename = "药材名", alias = "herb_name")]
    pub herb_name: String,
    /// Free-form suggestion text
    #[serde(rename = "建议内容", alias = "suggestion_text")]
    pub suggestion_text: String,
    /// Local wall-clock submission time, second precision
    #[serde(rename = "提交时间", alias = "submitted_at", with = "submitted_at_format")]
    pub submitted_at: NaiveDateTime,
    /// Unrecognized keys carried through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Suggestion {
    /// Create a suggestion stamped with the current local time
    ///
    /// Rejects a herb name or suggestion text that is empty or whitespace-only.
    /// Non-empty values are kept exactly as given.
    pub fn new(herb_name: impl Into<String>, suggestion_text: impl Into<String>) -> Result<Self> {
        Self::with_timestamp(
            herb_name,
            suggestion_text,
            Local::now().naive_local().trunc_subsecs(0),
        )
    }

    /// Create a suggestion with an explicit submission time
    pub fn with_timestamp(
        herb_name: impl Into<String>,
        suggestion_text: impl Into<String>,
        submitted_at: NaiveDateTime,
    ) -> Result<Self> {
        let herb_name = herb_name.into();
        let suggestion_text = suggestion_text.into();

        if herb_name.trim().is_empty() {
            return Err(Error::InvalidInput("Herb name cannot be empty".into()));
        }
        if suggestion_text.trim().is_empty() {
            return Err(Error::InvalidInput("Suggestion text cannot be empty".into()));
        }

        Ok(Self {
            herb_name,
            suggestion_text,
            submitted_at,
            extra: Map::new(),
        })
    }

    /// Submission time rendered as `YYYY-MM-DD HH:MM:SS`
    #[must_use]
    pub fn submitted_at_label(&self) -> String {
        self.submitted_at.format(SUBMITTED_AT_FORMAT).to_string()
    }
}

/// Ordered, append-only collection of suggestions stored as one remote file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuggestionLog {
    entries: Vec<Suggestion>,
}

impl SuggestionLog {
    /// Create an empty log
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an entry at the end, keeping insertion order
    pub fn push(&mut self, entry: Suggestion) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn entries(&self) -> &[Suggestion] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Suggestion> {
        self.entries.iter()
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<Suggestion> {
        self.entries
    }
}

impl From<Vec<Suggestion>> for SuggestionLog {
    fn from(entries: Vec<Suggestion>) -> Self {
        Self { entries }
    }
}

impl<'a> IntoIterator for &'a SuggestionLog {
    type Item = &'a Suggestion;
    type IntoIter = std::slice::Iter<'a, Suggestion>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

mod submitted_at_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::SUBMITTED_AT_FORMAT;

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(SUBMITTED_AT_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, SUBMITTED_AT_FORMAT).map_err(serde::de::Error::custom)
    }
}
