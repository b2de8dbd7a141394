//! Herbs CLI - look up herbs and send improvement suggestions
//!
//! Each invocation performs one action and exits.

mod cli;
mod commands;
mod error;


use clap::Parser;
use herbs_core::sync::SuggestionLogSync;

use crate::cli::{Cli, Commands};
use crate::commands::common::AppContext;
use crate::commands::completions::run_completions;
use crate::commands::search::run_search;
use crate::commands::suggest::run_suggest;
use crate::commands::suggestions::run_suggestions;
use crate::error::CliError;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        if let Some(hint) = error.hint() {
            eprintln!("{hint}");
        }
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("herbs=info".parse().expect("valid directive"))
                .add_directive("herbs_core=info".parse().expect("valid directive")),
        )
        .init();

    let Cli { command, db_path } = Cli::parse();

    if let Commands::Completions { shell, output } = command {
        return run_completions(shell, output.as_deref());
    }

    // Every other command is a request; refuse to serve it without a credential.
    let context = AppContext::load(db_path)?;

    match command {
        Commands::Search { query, limit, json } => {
            run_search(&query, limit, json, &context.db_path, &context.reference)?;
        }
        Commands::Suggest { herb, text } => {
            let sync = SuggestionLogSync::new(context.content_store()?);
            run_suggest(&herb, &text, &sync).await?;
        }
        Commands::Suggestions { json } => {
            let sync = SuggestionLogSync::new(context.content_store()?);
            run_suggestions(json, &sync).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
