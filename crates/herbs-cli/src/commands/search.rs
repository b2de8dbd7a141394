use std::path::Path;

use herbs_core::config::ReferenceTableConfig;

use crate::commands::common::{format_herb_lines, search_herbs};
use crate::error::CliError;

pub fn run_search(
    query: &str,
    limit: usize,
    as_json: bool,
    db_path: &Path,
    schema: &ReferenceTableConfig,
) -> Result<(), CliError> {
    let records = search_herbs(query, limit, db_path, schema)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("No matching herbs found");
    } else {
        for line in format_herb_lines(&records) {
            println!("{line}");
        }
    }

    Ok(())
}
