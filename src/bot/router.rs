//! Parsing of `!command` chat messages.

use crate::helpdesk::FolderVisibility;
use regex::Regex;
use std::sync::LazyLock;

/// A recognized chat command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ask(String),
    Help,
    Refresh,
    Diagnose,
    DiagnoseKb,
    CheckArticle(u64),
    Visibility {
        folder_id: u64,
        level: Option<FolderVisibility>,
    },
    Test,
}

/// A command that was recognized but could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageError(pub String);

static COMMAND_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^!(\w+)(?:\s+(.*))?$").expect("Invalid regex"));

/// Parse a message.
///
/// Returns `None` for ordinary chat and unknown commands.
pub fn parse(message: &str) -> Option<Result<Command, UsageError>> {
    let caps = COMMAND_REGEX.captures(message.trim())?;
    let name = caps.get(1)?.as_str().to_lowercase();
    let args = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");

    let command = match name.as_str() {
        "ask" => {
            if args.is_empty() {
                Err(UsageError("Usage: `!ask <your question>`".to_string()))
            } else {
                Ok(Command::Ask(args.to_string()))
            }
        }
        "help" => Ok(Command::Help),
        "refresh" => Ok(Command::Refresh),
        "diagnose" => Ok(Command::Diagnose),
        "diagnose_kb" => Ok(Command::DiagnoseKb),
        "test" => Ok(Command::Test),
        "check_article" => args
            .parse()
            .map(Command::CheckArticle)
            .map_err(|_| UsageError("Usage: `!check_article <article_id>`".to_string())),
        "visibility" => parse_visibility(args),
        _ => return None,
    };

    Some(command)
}

fn parse_visibility(args: &str) -> Result<Command, UsageError> {
    let usage = || {
        UsageError(
            "Usage: `!visibility <folder_id> [all|logged_in|agents|companies]`".to_string(),
        )
    };

    let mut parts = args.split_whitespace();
    let folder_id = parts
        .next()
        .and_then(|id| id.parse().ok())
        .ok_or_else(usage)?;

    let level = match parts.collect::<Vec<_>>().join(" ") {
        rest if rest.is_empty() => None,
        rest => Some(rest.parse().map_err(|_| usage())?),
    };

    Ok(Command::Visibility { folder_id, level })
}
