//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod diagnose;
mod doctor;
mod history;
mod refresh;
mod search;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use diagnose::{run_check_article, run_diagnose, run_visibility};
pub use doctor::run_doctor;
pub use history::run_history;
pub use refresh::run_refresh;
pub use search::run_search;
pub use serve::run_serve;

use crate::assistant::Assistant;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::knowledge_base::RefreshReport;
use anyhow::Result;

/// Run pre-flight checks and wire up the assistant.
fn build_assistant(operation: Operation, settings: &Settings) -> Result<Assistant> {
    if let Err(e) = preflight::check(operation, settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'deskbot doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    Ok(Assistant::from_settings(settings)?)
}

/// Refresh the knowledge base behind a spinner.
async fn refresh_with_spinner(assistant: &Assistant) -> Result<RefreshReport> {
    let spinner = Output::spinner("Loading knowledge base articles...");
    let result = assistant.refresh().await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            Output::success(&format!(
                "Knowledge base loaded: {} articles",
                report.articles_cached
            ));
            Ok(report)
        }
        Err(e) => {
            Output::error(&format!("{}", e));
            Err(e.into())
        }
    }
}
