use herbs_core::sync::{ContentStore, SuggestionLogSync, WriteOutcome};

use crate::commands::common::{require_herb_name, resolve_suggestion_text, submit_suggestion};
use crate::error::CliError;

pub async fn run_suggest<S: ContentStore>(
    herb: &str,
    text_parts: &[String],
    sync: &SuggestionLogSync<S>,
) -> Result<(), CliError> {
    let herb_name = require_herb_name(herb)?;
    let text = resolve_suggestion_text(text_parts)?;

    let (suggestion, outcome) = submit_suggestion(herb_name, text, sync).await?;

    let path = sync.store().path();
    match outcome.write {
        WriteOutcome::Created => println!(
            "Created {path} with a suggestion for {}",
            suggestion.herb_name
        ),
        WriteOutcome::Updated => println!(
            "Saved suggestion for {} ({} in {path})",
            suggestion.herb_name, outcome.entries
        ),
    }

    Ok(())
}
