//! GitHub repository contents API backend for the suggestion log.

use std::fmt;

use reqwest::{header, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

use super::store::{ContentStore, PutFileRequest, RemoteFile, VersionToken, WriteOutcome};
use super::{SyncError, SyncResult};
use crate::config::SuggestionLogConfig;
use crate::util::compact_text;

const USER_AGENT: &str = concat!("herbs/", env!("CARGO_PKG_VERSION"));
const ACCEPT_GITHUB_JSON: &str = "application/vnd.github+json";
const API_VERSION_HEADER: &str = "X-GitHub-Api-Version";
const API_VERSION: &str = "2022-11-28";

#[derive(Clone)]
pub struct GitHubContentStore {
    client: reqwest::Client,
    url: String,
    path: String,
    branch: Option<String>,
    token: String,
}

impl fmt::Debug for GitHubContentStore {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("GitHubContentStore")
            .field("url", &self.url)
            .field("branch", &self.branch)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl GitHubContentStore {
    pub fn new(config: &SuggestionLogConfig) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|error| {
                SyncError::InvalidConfiguration(format!("failed to build HTTP client: {error}"))
            })?;

        Ok(Self {
            client,
            url: config.contents_url(),
            path: config.path.clone(),
            branch: config.branch.clone(),
            token: config.token.clone(),
        })
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.url)
            .bearer_auth(&self.token)
            .header(header::ACCEPT, ACCEPT_GITHUB_JSON)
            .header(API_VERSION_HEADER, API_VERSION)
    }
}

impl ContentStore for GitHubContentStore {
    fn path(&self) -> &str {
        &self.path
    }

    async fn get_file(&self) -> SyncResult<Option<RemoteFile>> {
        let mut request = self.request(Method::GET);
        if let Some(branch) = &self.branch {
            request = request.query(&[("ref", branch)]);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            tracing::debug!("{} not found in remote store", self.path);
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body, Operation::Read));
        }

        let body = response.text().await?;
        let payload = serde_json::from_str::<ContentsResponse>(&body).map_err(|error| {
            SyncError::Malformed(format!("unexpected contents API response: {error}"))
        })?;
        payload.into_remote_file(&self.path).map(Some)
    }

    async fn put_file(&self, request: PutFileRequest) -> SyncResult<WriteOutcome> {
        let creating = request.version.is_none();
        let body = PutContentsBody {
            message: &request.message,
            content: &request.encoded_content,
            sha: request.version.as_ref().map(VersionToken::as_str),
            branch: self.branch.as_deref(),
        };

        let response = self.request(Method::PUT).json(&body).send().await?;
        let status = response.status();

        match status {
            StatusCode::CREATED => Ok(WriteOutcome::Created),
            StatusCode::OK => Ok(WriteOutcome::Updated),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(classify_failure(
                    status,
                    &body,
                    Operation::Write { creating },
                ))
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    path: Option<String>,
    sha: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    content: Option<String>,
    encoding: Option<String>,
}

impl ContentsResponse {
    fn into_remote_file(self, requested_path: &str) -> SyncResult<RemoteFile> {
        if let Some(kind) = self.kind.as_deref().filter(|kind| *kind != "file") {
            return Err(SyncError::Malformed(format!(
                "{requested_path} is a {kind}, not a file"
            )));
        }
        if let Some(encoding) = self.encoding.as_deref().filter(|encoding| *encoding != "base64")
        {
            return Err(SyncError::Malformed(format!(
                "{requested_path} content is not inlined as base64 (encoding '{encoding}'); files above 1 MB are not supported"
            )));
        }

        Ok(RemoteFile {
            path: self.path.unwrap_or_else(|| requested_path.to_string()),
            encoded_content: self.content.unwrap_or_default(),
            version: VersionToken::new(self.sha),
        })
    }
}

#[derive(Debug, Serialize)]
struct PutContentsBody<'a> {
    message: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Read,
    Write { creating: bool },
}

fn classify_failure(status: StatusCode, body: &str, operation: Operation) -> SyncError {
    let message = parse_api_error(status, body);

    match (status, operation) {
        (StatusCode::FORBIDDEN, _) if message.to_ascii_lowercase().contains("rate limit") => {
            SyncError::Transient(message)
        }
        (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN, _) => SyncError::Unauthorized(message),
        (StatusCode::CONFLICT, Operation::Write { .. })
        | (StatusCode::UNPROCESSABLE_ENTITY, Operation::Write { creating: true }) => {
            SyncError::Conflict(message)
        }
        (StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS, _) => {
            SyncError::Transient(message)
        }
        (status, _) if status.is_server_error() => SyncError::Transient(message),
        (StatusCode::NOT_FOUND, Operation::Write { .. }) => SyncError::Rejected {
            status: status.as_u16(),
            message: format!(
                "{message}; check that the repository and branch exist and the token can write to them"
            ),
        },
        (status, _) => SyncError::Rejected {
            status: status.as_u16(),
            message,
        },
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
