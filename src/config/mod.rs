//! Configuration module for Deskbot.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, HelpdeskSettings, InteractionLogSettings,
    PromptSettings, RagSettings, ServerSettings, Settings,
};
