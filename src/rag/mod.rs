//! Answer generation grounded in retrieved knowledge base articles.

pub mod context;
mod composer;
mod openai;

pub use composer::AnswerComposer;
pub use openai::OpenAICompleter;

use crate::error::Result;
use async_trait::async_trait;

/// A single chat completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Trait for LLM completion clients.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Generate a completion for the request.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
