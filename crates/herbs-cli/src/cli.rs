use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "herbs")]
#[command(about = "Look up herbs and send improvement suggestions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to the reference database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search the reference table by name
    #[command(alias = "find")]
    Search {
        /// Part of the herb name
        query: String,
        /// Number of records to show (0 shows all)
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Submit an improvement suggestion for a herb
    Suggest {
        /// Herb the suggestion is about
        #[arg(long, value_name = "NAME")]
        herb: String,
        /// Suggestion text (read from stdin or $EDITOR when omitted)
        text: Vec<String>,
    },
    /// Show the suggestions submitted so far
    #[command(alias = "history")]
    Suggestions {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
