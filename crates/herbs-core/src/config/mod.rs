//! Process configuration.
//!
//! Everything the suggestion-log synchronizer and the reference lookup need is
//! read once at startup into explicit values that are passed by reference.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::util::{is_http_url, normalize_text_option};

pub const ENV_TOKEN: &str = "HERBS_GITHUB_TOKEN";
pub const ENV_REPO: &str = "HERBS_REPO";
pub const ENV_LOG_PATH: &str = "HERBS_LOG_PATH";
pub const ENV_API_URL: &str = "HERBS_API_URL";
pub const ENV_BRANCH: &str = "HERBS_BRANCH";
pub const ENV_TIMEOUT_SECS: &str = "HERBS_HTTP_TIMEOUT_SECS";
pub const ENV_TABLE: &str = "HERBS_TABLE";
pub const ENV_NAME_COLUMN: &str = "HERBS_NAME_COLUMN";

const DEFAULT_REPO: &str = "1849083010n-cell/herb-pending-suggestions";
const DEFAULT_LOG_PATH: &str = "pending.json";
const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const MAX_TIMEOUT_SECS: u64 = 120;
const DEFAULT_TABLE: &str = "herbs";
const DEFAULT_NAME_COLUMN: &str = "名称";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Location of and credential for the remote suggestion log.
#[derive(Clone, PartialEq, Eq)]
pub struct SuggestionLogConfig {
    /// Static bearer credential for the content API
    pub token: String,
    /// Content API base URL without trailing slash
    pub api_base_url: String,
    pub owner: String,
    pub repo: String,
    /// File path inside the repository
    pub path: String,
    /// Branch to read and write; the repository default when `None`
    pub branch: Option<String>,
    /// Timeout applied to every remote call
    pub timeout: Duration,
}

impl fmt::Debug for SuggestionLogConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SuggestionLogConfig")
            .field("token", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("path", &self.path)
            .field("branch", &self.branch)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SuggestionLogConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token =
            optional_trimmed(&lookup, ENV_TOKEN).ok_or(ConfigError::MissingVar(ENV_TOKEN))?;

        let repo_slug = value_or_default(&lookup, ENV_REPO, DEFAULT_REPO);
        let (owner, repo) = parse_repo_slug(&repo_slug)?;

        let path = normalize_log_path(&value_or_default(&lookup, ENV_LOG_PATH, DEFAULT_LOG_PATH))?;

        let api_base_url = value_or_default(&lookup, ENV_API_URL, DEFAULT_API_URL);
        if !is_http_url(&api_base_url) {
            return Err(ConfigError::Invalid(format!(
                "{ENV_API_URL} must start with http:// or https://"
            )));
        }
        let api_base_url = api_base_url.trim_end_matches('/').to_string();

        let branch = optional_trimmed(&lookup, ENV_BRANCH);

        let timeout_secs =
            value_or_default(&lookup, ENV_TIMEOUT_SECS, &DEFAULT_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .map_err(|_| {
                    ConfigError::Invalid(format!(
                        "{ENV_TIMEOUT_SECS} must be an integer in [1, {MAX_TIMEOUT_SECS}]"
                    ))
                })?;
        if !(1..=MAX_TIMEOUT_SECS).contains(&timeout_secs) {
            return Err(ConfigError::Invalid(format!(
                "{ENV_TIMEOUT_SECS} must be in [1, {MAX_TIMEOUT_SECS}]"
            )));
        }

        Ok(Self {
            token,
            api_base_url,
            owner,
            repo,
            path,
            branch,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Contents API URL of the log file.
    #[must_use]
    pub fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base_url, self.owner, self.repo, self.path
        )
    }
}

/// Shape of the local reference table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTableConfig {
    pub table: String,
    /// Column matched by name lookups
    pub name_column: String,
}

impl Default for ReferenceTableConfig {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            name_column: DEFAULT_NAME_COLUMN.to_string(),
        }
    }
}

impl ReferenceTableConfig {
    pub fn from_env() -> Self {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            table: value_or_default(&lookup, ENV_TABLE, DEFAULT_TABLE),
            name_column: value_or_default(&lookup, ENV_NAME_COLUMN, DEFAULT_NAME_COLUMN),
        }
    }
}

fn optional_trimmed(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    normalize_text_option(lookup(name))
}

fn value_or_default(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: &str,
) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn parse_repo_slug(slug: &str) -> Result<(String, String), ConfigError> {
    let invalid = || ConfigError::Invalid(format!("{ENV_REPO} must look like owner/repo"));
    let (owner, repo) = slug.split_once('/').ok_or_else(invalid)?;
    let (owner, repo) = (owner.trim(), repo.trim());
    if owner.is_empty() || repo.is_empty() || repo.contains('/') {
        return Err(invalid());
    }
    Ok((owner.to_string(), repo.to_string()))
}

fn normalize_log_path(raw: &str) -> Result<String, ConfigError> {
    let path = raw.trim().trim_matches('/');
    if path.is_empty() {
        return Err(ConfigError::Invalid(format!(
            "{ENV_LOG_PATH} must not be empty"
        )));
    }
    if path.split('/').any(|segment| segment.is_empty() || segment == "..") {
        return Err(ConfigError::Invalid(format!(
            "{ENV_LOG_PATH} contains an invalid path segment"
        )));
    }
    Ok(path.to_string())
}
