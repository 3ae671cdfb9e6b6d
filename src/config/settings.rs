//! Configuration settings for Deskbot.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub helpdesk: HelpdeskSettings,
    pub embedding: EmbeddingSettings,
    pub rag: RagSettings,
    pub interaction_log: InteractionLogSettings,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.deskbot".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Helpdesk (Freshdesk) connection and ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpdeskSettings {
    /// Freshdesk subdomain (the `acme` in `acme.freshdesk.com`).
    pub domain: String,
    /// API key. Usually supplied through `FRESHDESK_API_KEY` instead.
    pub api_key: Option<String>,
    /// Overrides the API base URL derived from `domain`.
    pub base_url: Option<String>,
    /// Articles requested per page when listing a folder.
    pub page_size: u32,
    /// Timeout for a single helpdesk request, in seconds.
    pub timeout_secs: u64,
    /// Maximum concurrent article fetches within one folder.
    pub fetch_concurrency: usize,
    /// Categories whose folders are ingested (case-insensitive).
    pub allowed_categories: Vec<String>,
}

impl Default for HelpdeskSettings {
    fn default() -> Self {
        Self {
            domain: String::new(),
            api_key: None,
            base_url: None,
            page_size: 30,
            timeout_secs: 30,
            fetch_concurrency: 4,
            allowed_categories: default_allowed_categories(),
        }
    }
}

fn default_allowed_categories() -> Vec<String> {
    [
        "General Info",
        "Training Programme (Customer Success)",
        "Workflow",
        "Corporate Gift Products",
        "Product Specific Articles",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl HelpdeskSettings {
    /// API base URL, e.g. `https://acme.freshdesk.com/api/v2`.
    pub fn api_base_url(&self) -> String {
        match &self.base_url {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!("https://{}.freshdesk.com/api/v2", self.domain),
        }
    }

    /// Public portal base URL used for article links.
    pub fn portal_url(&self) -> String {
        format!("https://{}.freshdesk.com", self.domain)
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
        }
    }
}

/// Retrieval and answer generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// LLM model for response generation.
    pub model: String,
    /// Maximum tokens in a generated answer.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Number of articles considered as grounding context.
    pub top_k: usize,
    /// Articles must score strictly above this similarity to be used.
    pub min_score: f32,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4-turbo-preview".to_string(),
            max_tokens: 1000,
            temperature: 0.7,
            top_k: 3,
            min_score: 0.2,
        }
    }
}

/// Interaction log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionLogSettings {
    /// Path to the SQLite database holding logged interactions.
    pub sqlite_path: String,
    /// Offset from UTC used for the logged date column.
    pub utc_offset_hours: i32,
}

impl Default for InteractionLogSettings {
    fn default() -> Self {
        Self {
            sqlite_path: "~/.deskbot/interactions.db".to_string(),
            utc_offset_hours: 8,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied after the file is read.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Apply `FRESHDESK_DOMAIN`, `FRESHDESK_API_KEY` and `PORT` overrides.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(domain) = lookup("FRESHDESK_DOMAIN").filter(|v| !v.is_empty()) {
            self.helpdesk.domain = domain;
        }
        if let Some(key) = lookup("FRESHDESK_API_KEY").filter(|v| !v.is_empty()) {
            self.helpdesk.api_key = Some(key);
        }
        if let Some(port) = lookup("PORT").and_then(|v| v.parse::<u16>().ok()) {
            self.server.port = port;
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::DeskbotError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("deskbot")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded interaction log database path.
    pub fn interaction_log_path(&self) -> PathBuf {
        Self::expand_path(&self.interaction_log.sqlite_path)
    }
}
