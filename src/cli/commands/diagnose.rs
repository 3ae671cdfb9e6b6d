//! Diagnose, check-article and visibility commands.

use super::{build_assistant, refresh_with_spinner};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::diagnostics;
use crate::error::DeskbotError;
use crate::helpdesk::FolderVisibility;
use anyhow::Result;

/// List helpdesk categories and folders, or summarize the cache.
pub async fn run_diagnose(cache: bool, settings: Settings) -> Result<()> {
    if cache {
        let assistant = build_assistant(Operation::Answer, &settings)?;
        refresh_with_spinner(&assistant).await?;
        Output::header("Knowledge base content");
        println!("{}", assistant.diagnose_cache().render());
        return Ok(());
    }

    let assistant = build_assistant(Operation::Helpdesk, &settings)?;
    let spinner = Output::spinner("Listing categories and folders...");
    let result = assistant.diagnose().await;
    spinner.finish_and_clear();

    match result {
        Ok(report) => {
            Output::header("Freshdesk diagnostic");
            println!("{}", report.render());
            Ok(())
        }
        Err(DeskbotError::Unauthorized) => {
            Output::error("Authentication failed. Please check your Freshdesk API key.");
            Err(DeskbotError::Unauthorized.into())
        }
        Err(e) => {
            Output::error(&format!("API access error: {}", e));
            Err(e.into())
        }
    }
}

/// Look up one article directly.
pub async fn run_check_article(article_id: u64, settings: Settings) -> Result<()> {
    let assistant = build_assistant(Operation::Helpdesk, &settings)?;
    let helpdesk = assistant.knowledge_base().helpdesk();

    match diagnostics::check_article(helpdesk.as_ref(), article_id).await {
        Ok(check) => {
            println!("{}", check.render());
            Ok(())
        }
        Err(DeskbotError::NotFound(_)) => {
            Output::error(&format!("Article {} not found", article_id));
            Err(anyhow::anyhow!("article {} not found", article_id))
        }
        Err(e) => {
            Output::error(&format!("Error checking article: {}", e));
            Err(e.into())
        }
    }
}

/// Set a folder's visibility and report the change.
pub async fn run_visibility(
    folder_id: u64,
    level: FolderVisibility,
    settings: Settings,
) -> Result<()> {
    let assistant = build_assistant(Operation::Helpdesk, &settings)?;
    Output::info(&format!("Checking visibility for folder {}...", folder_id));

    let change = assistant.set_folder_visibility(folder_id, level).await?;
    Output::success("Updated folder visibility");
    Output::kv("Folder", &format!("{} ({})", change.folder_name, change.folder_id));
    Output::kv(
        "Before",
        &change
            .before
            .map(|v| v.to_string())
            .unwrap_or_else(|| "Not specified".to_string()),
    );
    Output::kv(
        "After",
        &change
            .after
            .map(|v| v.to_string())
            .unwrap_or_else(|| "Not specified".to_string()),
    );

    Ok(())
}
