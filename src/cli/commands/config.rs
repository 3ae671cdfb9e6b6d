//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: Option<PathBuf>) -> Result<()> {
    let config_path = config_path.unwrap_or_else(Settings::default_config_path);

    match action {
        ConfigAction::Show => {
            let mut shown = settings;
            if shown.helpdesk.api_key.is_some() {
                shown.helpdesk.api_key = Some("********".to_string());
            }
            let toml_str = toml::to_string_pretty(&shown)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let updated = set_value(&settings, key, value)?;
            updated.save_to(&config_path)?;
            Output::success(&format!("Set {} = {}", key, value));
            Output::info(&format!("Saved to {}", config_path.display()));
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Return a copy of `settings` with the dotted `key` set to `value`.
fn set_value(settings: &Settings, key: &str, value: &str) -> Result<Settings> {
    let mut root = toml::Value::try_from(settings).context("Failed to serialize config")?;

    let mut parts = key.split('.').peekable();
    let mut node = &mut root;
    while let Some(part) = parts.next() {
        let table = match node.as_table_mut() {
            Some(table) => table,
            None => bail!("'{}' is not a configuration section", key),
        };

        if parts.peek().is_none() {
            let existing = table.get(part);
            let parsed = parse_value(existing, value)
                .with_context(|| format!("Invalid value for {}: {}", key, value))?;
            table.insert(part.to_string(), parsed);
            break;
        }

        node = match table.get_mut(part) {
            Some(child) => child,
            None => bail!("Unknown configuration key: {}", key),
        };
    }

    root.try_into().with_context(|| format!("Invalid value for {}", key))
}

/// Parse `raw` with the type of the existing value, if any.
fn parse_value(existing: Option<&toml::Value>, raw: &str) -> Result<toml::Value> {
    Ok(match existing {
        Some(toml::Value::Integer(_)) => toml::Value::Integer(raw.parse()?),
        Some(toml::Value::Float(_)) => toml::Value::Float(raw.parse()?),
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(raw.parse()?),
        Some(toml::Value::Array(_)) => toml::Value::Array(
            raw.split(',')
                .map(|s| toml::Value::String(s.trim().to_string()))
                .collect(),
        ),
        _ => toml::Value::String(raw.to_string()),
    })
}
