use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use herbs_core::config::ReferenceTableConfig;
use herbs_core::db::{HerbDatabase, HerbRepository, SqliteHerbRepository};
use herbs_core::sync::{AppendOutcome, ContentStore, GitHubContentStore, SuggestionLogSync};
use herbs_core::{HerbRecord, Suggestion, SuggestionLog, SuggestionLogConfig};
use serde::Serialize;

use crate::error::CliError;

pub const ENV_DB_PATH: &str = "HERBS_DB_PATH";

/// Settings resolved once per invocation
pub struct AppContext {
    pub db_path: PathBuf,
    pub reference: ReferenceTableConfig,
    pub log: SuggestionLogConfig,
}

impl AppContext {
    /// Fails when the suggestion-log credential is missing
    pub fn load(cli_db_path: Option<PathBuf>) -> Result<Self, CliError> {
        let log = SuggestionLogConfig::from_env()?;
        tracing::debug!(config = ?log, "Loaded suggestion log configuration");

        Ok(Self {
            db_path: resolve_db_path(cli_db_path)?,
            reference: ReferenceTableConfig::from_env(),
            log,
        })
    }

    pub fn content_store(&self) -> Result<GitHubContentStore, CliError> {
        Ok(GitHubContentStore::new(&self.log)?)
    }
}

#[derive(Debug, Serialize)]
pub struct SuggestionListItem {
    pub index: usize,
    pub herb_name: String,
    pub suggestion_text: String,
    pub submitted_at: String,
}

pub fn search_herbs(
    query: &str,
    limit: usize,
    db_path: &Path,
    schema: &ReferenceTableConfig,
) -> Result<Vec<HerbRecord>, CliError> {
    let db = HerbDatabase::open(db_path)?;
    let repo = SqliteHerbRepository::new(db.connection(), schema);
    Ok(repo.search_by_name(query, limit)?)
}

pub async fn submit_suggestion<S: ContentStore>(
    herb_name: &str,
    suggestion_text: String,
    sync: &SuggestionLogSync<S>,
) -> Result<(Suggestion, AppendOutcome), CliError> {
    let suggestion = Suggestion::new(herb_name, suggestion_text)?;
    let outcome = sync.append(suggestion.clone()).await?;
    Ok((suggestion, outcome))
}

pub async fn load_suggestions<S: ContentStore>(
    sync: &SuggestionLogSync<S>,
) -> Result<SuggestionLog, CliError> {
    Ok(sync.fetch().await?)
}

pub fn format_herb_lines(records: &[HerbRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| {
            format!(
                "ID: {} | Name: {} | Effect: {} | Organ: {}",
                record.id,
                record.name,
                record.effect_label(),
                record.organ_label()
            )
        })
        .collect()
}

pub fn format_suggestion_lines(log: &SuggestionLog) -> Vec<String> {
    let mut lines = Vec::new();
    for (index, entry) in log.iter().enumerate() {
        lines.push(format!(
            "{}. {}  ({})",
            index + 1,
            entry.herb_name,
            entry.submitted_at_label()
        ));
        for text_line in entry.suggestion_text.lines() {
            lines.push(format!("   {text_line}"));
        }
    }
    lines
}

pub fn suggestion_to_list_item(index: usize, entry: &Suggestion) -> SuggestionListItem {
    SuggestionListItem {
        index: index + 1,
        herb_name: entry.herb_name.clone(),
        suggestion_text: entry.suggestion_text.clone(),
        submitted_at: entry.submitted_at_label(),
    }
}

/// Suggestion text from args, piped stdin, or `$EDITOR`, kept as typed
pub fn resolve_suggestion_text(text_parts: &[String]) -> Result<String, CliError> {
    if let Some(text) = non_blank(&text_parts.join(" ")) {
        return Ok(text);
    }

    if let Some(text) = read_piped_stdin()? {
        return Ok(text);
    }

    if let Some(text) = capture_editor_input()? {
        return Ok(text);
    }

    Err(CliError::EmptySuggestion)
}

/// `content` unchanged, or `None` when it is only whitespace
pub fn non_blank(content: &str) -> Option<String> {
    if content.trim().is_empty() {
        None
    } else {
        Some(content.to_string())
    }
}

pub fn require_herb_name(name: &str) -> Result<&str, CliError> {
    if name.trim().is_empty() {
        Err(CliError::EmptyHerbName)
    } else {
        Ok(name)
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(non_blank(&buffer))
}

pub fn capture_editor_input() -> Result<Option<String>, CliError> {
    capture_editor_input_at(&preferred_editor(), &create_temp_suggestion_file_path())
}

/// Open `editor` on an empty file at `temp_file`; the file is removed either way
pub fn capture_editor_input_at(
    editor: &str,
    temp_file: &Path,
) -> Result<Option<String>, CliError> {
    std::fs::write(temp_file, "")?;

    let launch_result = launch_editor(editor, temp_file);
    let read_result = std::fs::read_to_string(temp_file);
    let _ = std::fs::remove_file(temp_file);

    launch_result?;
    Ok(non_blank(&read_result?))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(CliError::EditorFailed(format!(
            "`{editor}` exited with status {status}"
        ))),
        // `EDITOR="code --wait"` style values carry their own arguments
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let status = Command::new(program).args(parts).arg(file_path).status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_suggestion_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("herbs-suggestion-{}-{now}.txt", std::process::id()))
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(path) = cli_db_path.or_else(|| env::var_os(ENV_DB_PATH).map(PathBuf::from)) {
        return Ok(path);
    }
    default_db_path()
}

pub fn default_db_path() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("herbs").join("herbs.db"))
        .ok_or(CliError::NoDataDir)
}
