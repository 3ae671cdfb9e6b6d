//! Search command implementation.

use super::{build_assistant, refresh_with_spinner};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(query: &str, limit: usize, settings: Settings) -> Result<()> {
    let assistant = build_assistant(Operation::Answer, &settings)?;
    refresh_with_spinner(&assistant).await?;

    let spinner = Output::spinner("Searching...");
    let results = assistant.search(query, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(articles) if articles.is_empty() => {
            Output::warning("No articles scored above the relevance threshold.");
        }
        Ok(articles) => {
            Output::success(&format!("Found {} articles", articles.len()));
            for article in &articles {
                Output::article(article);
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
