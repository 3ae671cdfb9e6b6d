//! History command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::interaction_log::{InteractionLog, SqliteInteractionLog};
use anyhow::Result;
use console::style;

/// Show the most recent logged interactions.
pub async fn run_history(limit: usize, settings: Settings) -> Result<()> {
    let path = settings.interaction_log_path();
    if !path.exists() {
        Output::warning(&format!("No interaction log at {}", path.display()));
        return Ok(());
    }

    let log = SqliteInteractionLog::new(&path, settings.interaction_log.utc_offset_hours)?;
    let interactions = log.recent(limit).await?;

    if interactions.is_empty() {
        Output::info("No interactions logged yet.");
        return Ok(());
    }

    for interaction in &interactions {
        println!(
            "\n{} {} [{}]",
            style(&interaction.date).dim(),
            style(&interaction.question).bold(),
            interaction.status
        );
        if let Some(feedback) = interaction.feedback {
            Output::kv("Feedback", feedback.label());
        }
        let first_line = interaction.answer.lines().next().unwrap_or_default();
        println!("   {}", first_line);
    }

    Ok(())
}
