//! Pre-flight checks before talking to external services.
//!
//! Fails fast with a clear message instead of midway through a refresh.

use crate::config::Settings;
use crate::error::{DeskbotError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Refreshing and answering need the helpdesk and OpenAI.
    Answer,
    /// Diagnostics only talk to the helpdesk.
    Helpdesk,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_with(operation, settings, |key| std::env::var(key).ok())
}

fn check_with<F>(operation: Operation, settings: &Settings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    check_helpdesk(settings)?;
    if let Operation::Answer = operation {
        check_api_key(lookup)?;
    }
    Ok(())
}

fn check_helpdesk(settings: &Settings) -> Result<()> {
    if settings.helpdesk.domain.trim().is_empty() && settings.helpdesk.base_url.is_none() {
        return Err(DeskbotError::Config(
            "Freshdesk domain not set. Set it with: export FRESHDESK_DOMAIN='yourcompany'".to_string(),
        ));
    }
    match settings.helpdesk.api_key.as_deref() {
        Some(key) if !key.is_empty() => Ok(()),
        _ => Err(DeskbotError::Config(
            "FRESHDESK_API_KEY not set. Set it with: export FRESHDESK_API_KEY='...'".to_string(),
        )),
    }
}

fn check_api_key<F>(lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("OPENAI_API_KEY") {
        Some(key) if !key.is_empty() => Ok(()),
        Some(_) => Err(DeskbotError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        None => Err(DeskbotError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}
