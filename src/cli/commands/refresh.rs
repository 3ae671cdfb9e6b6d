//! Refresh command implementation.

use super::{build_assistant, refresh_with_spinner};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the refresh command.
pub async fn run_refresh(json: bool, settings: Settings) -> Result<()> {
    let assistant = build_assistant(Operation::Answer, &settings)?;
    let report = refresh_with_spinner(&assistant).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    Output::header("Refresh report");
    Output::refresh_report(&report);

    let snapshot = assistant.knowledge_base().snapshot();
    let recent = snapshot.most_recent(5);
    if !recent.is_empty() {
        Output::header("Most recently updated");
        for article in recent {
            let updated = article
                .updated_at
                .map(|t| t.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            Output::kv(&updated, &format!("{} ({})", article.title, article.category));
        }
    }

    Ok(())
}
