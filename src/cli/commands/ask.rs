//! Ask command implementation.

use super::{build_assistant, refresh_with_spinner};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, top_k: Option<usize>, settings: Settings) -> Result<()> {
    let mut assistant = build_assistant(Operation::Answer, &settings)?;
    if let Some(k) = top_k {
        assistant = assistant.with_top_k(k);
    }

    refresh_with_spinner(&assistant).await?;

    let spinner = Output::spinner("Searching knowledge base...");
    let answer = assistant.ask(question).await;
    spinner.finish_and_clear();

    println!("\n{}\n", answer.text);

    if !answer.sources.is_empty() {
        Output::header("Scores");
        for source in &answer.sources {
            Output::kv(&source.title, &format!("{:.3}", source.score));
        }
    }

    Ok(())
}
