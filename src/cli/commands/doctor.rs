//! Doctor command - verify environment and configuration.

use crate::cli::Output;
use crate::config::Settings;
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &std::path::Path) -> anyhow::Result<()> {
    Output::header("Deskbot Doctor");
    println!();
    println!("Checking environment and configuration...\n");

    let lookup = |key: &str| std::env::var(key).ok();
    let mut checks = Vec::new();

    let sections: [(&str, Vec<CheckResult>); 4] = [
        ("Freshdesk", check_helpdesk(settings)),
        ("OpenAI", vec![check_openai_api_key(lookup("OPENAI_API_KEY"))]),
        ("Interaction log", vec![check_interaction_log(settings)]),
        ("Configuration", vec![check_config_file(config_path)]),
    ];

    for (title, results) in sections {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    }

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Deskbot.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Deskbot is ready to use.");
    }

    Ok(())
}

fn check_helpdesk(settings: &Settings) -> Vec<CheckResult> {
    let helpdesk = &settings.helpdesk;
    let mut results = Vec::new();

    if helpdesk.domain.trim().is_empty() && helpdesk.base_url.is_none() {
        results.push(CheckResult::error(
            "FRESHDESK_DOMAIN",
            "not set",
            "Set with: export FRESHDESK_DOMAIN='yourcompany'",
        ));
    } else {
        results.push(CheckResult::ok("API endpoint", &helpdesk.api_base_url()));
    }

    match helpdesk.api_key.as_deref() {
        Some(key) if !key.is_empty() => {
            results.push(CheckResult::ok("FRESHDESK_API_KEY", &format!("configured ({})", mask(key))))
        }
        _ => results.push(CheckResult::error(
            "FRESHDESK_API_KEY",
            "not set",
            "Set with: export FRESHDESK_API_KEY='...' (Profile settings > API key)",
        )),
    }

    if helpdesk.allowed_categories.is_empty() {
        results.push(CheckResult::warning(
            "Allowed categories",
            "none configured",
            "No articles will be cached; set helpdesk.allowed_categories",
        ));
    } else {
        results.push(CheckResult::ok(
            "Allowed categories",
            &helpdesk.allowed_categories.join(", "),
        ));
    }

    results
}

fn check_openai_api_key(value: Option<String>) -> CheckResult {
    match value {
        Some(key) if key.starts_with("sk-") && key.len() > 20 => {
            CheckResult::ok("OPENAI_API_KEY", &format!("configured ({})", mask(&key)))
        }
        Some(key) if key.is_empty() => CheckResult::error(
            "OPENAI_API_KEY",
            "empty",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
        Some(_) => CheckResult::warning(
            "OPENAI_API_KEY",
            "set but format looks unusual",
            "Expected format: sk-... (OpenAI API key)",
        ),
        None => CheckResult::error(
            "OPENAI_API_KEY",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...'",
        ),
    }
}

fn check_interaction_log(settings: &Settings) -> CheckResult {
    let path = settings.interaction_log_path();
    if path.exists() {
        let size = std::fs::metadata(&path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "unknown size".to_string());
        CheckResult::ok("Database", &format!("{} ({})", path.display(), size))
    } else {
        CheckResult::warning(
            "Database",
            &format!("{} (not created yet)", path.display()),
            "Created on the first chat or serve session",
        )
    }
}

fn check_config_file(config_path: &std::path::Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults and environment",
            "Create with: deskbot config set helpdesk.domain <yourcompany>",
        )
    }
}

/// Keep the first and last four characters of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Format file size in human-readable format.
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
