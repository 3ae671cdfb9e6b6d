//! Answer composition from relevant articles.

use super::context::{format_context_for_prompt, format_sources, no_information_message};
use super::{Completer, CompletionRequest};
use crate::config::Prompts;
use crate::knowledge_base::RelevantArticle;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Turns a question plus retrieved articles into a user-facing answer.
pub struct AnswerComposer {
    completer: Arc<dyn Completer>,
    prompts: Prompts,
    categories: Vec<String>,
    max_tokens: u32,
    temperature: f32,
}

impl AnswerComposer {
    /// Create a composer. `categories` are listed when nothing relevant is found.
    pub fn new(completer: Arc<dyn Completer>, categories: Vec<String>) -> Self {
        Self {
            completer,
            prompts: Prompts::default(),
            categories,
            max_tokens: 1000,
            temperature: 0.7,
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Compose an answer. Never fails: generation errors become an apology.
    ///
    /// Without articles no completion is requested.
    #[instrument(skip(self, articles), fields(sources = articles.len()))]
    pub async fn compose(&self, question: &str, articles: &[RelevantArticle]) -> String {
        if articles.is_empty() {
            info!("No relevant articles, skipping generation");
            return no_information_message(&self.categories);
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context_for_prompt(articles));

        let request = CompletionRequest {
            system: self.prompts.rag.system.clone(),
            user: self.prompts.render_with_custom(&self.prompts.rag.user, &vars),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        match self.completer.complete(&request).await {
            Ok(answer) => format!("{}{}", answer.trim(), format_sources(articles)),
            Err(e) => {
                error!("Answer generation failed: {}", e);
                format!(
                    "I encountered an error while processing your question: {}\n\nPlease try again in a moment.",
                    e
                )
            }
        }
    }
}
