use herbs_core::sync::{ContentStore, SuggestionLogSync};

use crate::commands::common::{
    format_suggestion_lines, load_suggestions, suggestion_to_list_item, SuggestionListItem,
};
use crate::error::CliError;

pub async fn run_suggestions<S: ContentStore>(
    as_json: bool,
    sync: &SuggestionLogSync<S>,
) -> Result<(), CliError> {
    let log = load_suggestions(sync).await?;

    if as_json {
        let json_items = log
            .iter()
            .enumerate()
            .map(|(index, entry)| suggestion_to_list_item(index, entry))
            .collect::<Vec<SuggestionListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if log.is_empty() {
        println!("No suggestions yet");
    } else {
        for line in format_suggestion_lines(&log) {
            println!("{line}");
        }
    }

    Ok(())
}
