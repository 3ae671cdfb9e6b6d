//! The question-answering assistant: knowledge base plus answer composer.

use crate::config::{Prompts, Settings};
use crate::diagnostics::{self, ArticleCheck, CacheSummary, DiagnosticReport, VisibilityChange};
use crate::embedding::OpenAIEmbedder;
use crate::error::Result;
use crate::helpdesk::{FolderVisibility, FreshdeskClient};
use crate::knowledge_base::{AllowedCategories, KnowledgeBase, RefreshReport, RelevantArticle};
use crate::rag::{AnswerComposer, OpenAICompleter};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// An answer with the articles it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    pub question: String,
    pub text: String,
    pub sources: Vec<RelevantArticle>,
}

/// Owns the knowledge base and answers questions from it.
pub struct Assistant {
    knowledge_base: Arc<KnowledgeBase>,
    composer: AnswerComposer,
    top_k: usize,
}

impl Assistant {
    /// Create an assistant from its parts.
    pub fn new(knowledge_base: Arc<KnowledgeBase>, composer: AnswerComposer) -> Self {
        Self {
            knowledge_base,
            composer,
            top_k: 3,
        }
    }

    /// Set how many articles are considered per question.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Wire up Freshdesk, OpenAI embeddings and OpenAI completions from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let helpdesk = Arc::new(FreshdeskClient::from_settings(&settings.helpdesk)?);
        let embedder = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);
        let completer = Arc::new(OpenAICompleter::new(&settings.rag.model)?);
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let allowed = AllowedCategories::new(settings.helpdesk.allowed_categories.clone());
        let categories = allowed.names().to_vec();

        let knowledge_base = KnowledgeBase::new(helpdesk, embedder, allowed)
            .with_page_size(settings.helpdesk.page_size)
            .with_fetch_concurrency(settings.helpdesk.fetch_concurrency)
            .with_min_score(settings.rag.min_score);

        let composer = AnswerComposer::new(completer, categories)
            .with_prompts(prompts)
            .with_max_tokens(settings.rag.max_tokens)
            .with_temperature(settings.rag.temperature);

        Ok(Self::new(Arc::new(knowledge_base), composer).with_top_k(settings.rag.top_k))
    }

    pub fn knowledge_base(&self) -> &Arc<KnowledgeBase> {
        &self.knowledge_base
    }

    /// Rebuild the knowledge base cache.
    pub async fn refresh(&self) -> Result<RefreshReport> {
        self.knowledge_base.refresh().await
    }

    /// Retrieve up to `k` relevant articles without generating an answer.
    pub async fn search(&self, question: &str, k: usize) -> Result<Vec<RelevantArticle>> {
        self.knowledge_base.search(question, k).await
    }

    /// Answer a question. Retrieval or generation problems are reported in
    /// the answer text rather than returned as errors.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn ask(&self, question: &str) -> Answer {
        info!("Processing question: {}", question);

        let sources = match self.knowledge_base.search(question, self.top_k).await {
            Ok(sources) => sources,
            Err(e) => {
                warn!("Error finding relevant articles: {}", e);
                Vec::new()
            }
        };

        let text = self.composer.compose(question, &sources).await;

        Answer {
            question: question.to_string(),
            text,
            sources,
        }
    }

    /// Walk every helpdesk category and folder and report what is visible.
    pub async fn diagnose(&self) -> Result<DiagnosticReport> {
        diagnostics::diagnose(
            self.knowledge_base.helpdesk().as_ref(),
            self.knowledge_base.allowed_categories(),
        )
        .await
    }

    /// Summarize the cached articles by category.
    pub fn diagnose_cache(&self) -> CacheSummary {
        diagnostics::summarize_cache(&self.knowledge_base.snapshot())
    }

    /// Look up one article directly and check whether it is cached.
    pub async fn check_article(&self, article_id: u64) -> Result<ArticleCheck> {
        let mut check =
            diagnostics::check_article(self.knowledge_base.helpdesk().as_ref(), article_id).await?;
        let id = article_id.to_string();
        check.cached = Some(
            self.knowledge_base
                .snapshot()
                .articles()
                .iter()
                .any(|a| a.id == id),
        );
        Ok(check)
    }

    /// Change a folder's portal visibility.
    pub async fn set_folder_visibility(
        &self,
        folder_id: u64,
        visibility: FolderVisibility,
    ) -> Result<VisibilityChange> {
        diagnostics::update_folder_visibility(
            self.knowledge_base.helpdesk().as_ref(),
            folder_id,
            visibility,
        )
        .await
    }
}
