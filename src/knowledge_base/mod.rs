//! In-memory knowledge base of published helpdesk articles.
//!
//! The cache is an immutable [`Snapshot`] behind an `Arc`. A refresh builds a
//! complete new snapshot and swaps it in, so searches running concurrently
//! always see either the old or the new corpus, never a half-built one.

pub mod loader;
pub mod ranker;

pub use loader::LoaderOptions;
pub use ranker::cosine_similarity;

use crate::embedding::{truncate_input, Embedder};
use crate::error::{DeskbotError, Result};
use crate::helpdesk::{ArticleStatus, HelpdeskClient};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::{error, info, instrument};

/// Default minimum similarity for an article to count as relevant.
pub const DEFAULT_MIN_SCORE: f32 = 0.2;

/// A cached knowledge base article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Helpdesk article ID.
    pub id: String,
    pub title: String,
    /// Plain-text body.
    pub description: String,
    /// Public article URL.
    pub url: String,
    pub category: String,
    pub folder: String,
    pub status: ArticleStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Article {
    /// Text embedded for this article: category, folder, title and body.
    ///
    /// Long bodies are cut to [`crate::embedding::MAX_INPUT_CHARS`] so one article cannot
    /// exceed the embedding model's input limit.
    pub fn embedding_text(&self) -> String {
        let text = format!(
            "Category: {}\nFolder: {}\nTitle: {}\n\n{}",
            self.category, self.folder, self.title, self.description
        );
        truncate_input(&text).to_string()
    }
}

/// An article selected as relevant to a question.
#[derive(Debug, Clone, Serialize)]
pub struct RelevantArticle {
    pub title: String,
    pub content: String,
    pub category: String,
    pub folder: String,
    pub url: String,
    /// Cosine similarity to the question.
    pub score: f32,
}

impl RelevantArticle {
    fn from_article(article: &Article, score: f32) -> Self {
        Self {
            title: article.title.clone(),
            content: article.description.clone(),
            category: article.category.clone(),
            folder: article.folder.clone(),
            url: article.url.clone(),
            score,
        }
    }
}

/// Category names eligible for ingestion, matched case-insensitively.
#[derive(Debug, Clone)]
pub struct AllowedCategories {
    names: Vec<String>,
}

impl AllowedCategories {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a category name is on the list.
    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.names.iter().any(|c| c.trim().to_lowercase() == name)
    }

    /// Configured names, in configuration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl Default for AllowedCategories {
    fn default() -> Self {
        Self::new(crate::config::HelpdeskSettings::default().allowed_categories)
    }
}

/// Immutable cache contents: articles and their index-aligned embeddings.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    articles: Vec<Article>,
    embeddings: Vec<Vec<f32>>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    /// The snapshot present before the first refresh.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a snapshot. `embeddings[i]` must belong to `articles[i]`.
    pub fn new(articles: Vec<Article>, embeddings: Vec<Vec<f32>>) -> Result<Self> {
        if articles.len() != embeddings.len() {
            return Err(DeskbotError::Embedding(format!(
                "Got {} embeddings for {} articles",
                embeddings.len(),
                articles.len()
            )));
        }

        Ok(Self {
            articles,
            embeddings,
            refreshed_at: Some(Utc::now()),
        })
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty() || self.embeddings.is_empty()
    }

    /// When this snapshot was built. `None` for the startup snapshot.
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    /// The `n` most recently updated articles, newest first.
    pub fn most_recent(&self, n: usize) -> Vec<&Article> {
        let mut sorted: Vec<&Article> = self.articles.iter().collect();
        sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sorted.truncate(n);
        sorted
    }

    /// Articles grouped by category name.
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&Article>> {
        let mut groups: BTreeMap<&str, Vec<&Article>> = BTreeMap::new();
        for article in &self.articles {
            groups.entry(article.category.as_str()).or_default().push(article);
        }
        groups
    }
}

/// Counters describing one refresh.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshReport {
    pub articles_cached: usize,
    pub categories_visited: usize,
    pub categories_skipped: usize,
    pub folders_visited: usize,
    pub unpublished_skipped: usize,
    pub duplicates_skipped: usize,
    /// Folder or article fetches that failed and were skipped.
    pub failures: usize,
}

/// The knowledge base cache with refresh and similarity search.
pub struct KnowledgeBase {
    helpdesk: Arc<dyn HelpdeskClient>,
    embedder: Arc<dyn Embedder>,
    options: LoaderOptions,
    min_score: f32,
    snapshot: RwLock<Arc<Snapshot>>,
    refresh_guard: tokio::sync::Mutex<()>,
}

impl KnowledgeBase {
    /// Create an empty knowledge base.
    pub fn new(
        helpdesk: Arc<dyn HelpdeskClient>,
        embedder: Arc<dyn Embedder>,
        allowed: AllowedCategories,
    ) -> Self {
        Self {
            helpdesk,
            embedder,
            options: LoaderOptions {
                allowed,
                ..Default::default()
            },
            min_score: DEFAULT_MIN_SCORE,
            snapshot: RwLock::new(Arc::new(Snapshot::empty())),
            refresh_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Set the number of articles requested per folder page.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.options.page_size = page_size;
        self
    }

    /// Set the number of concurrent article fetches per folder.
    pub fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.options.fetch_concurrency = concurrency;
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn allowed_categories(&self) -> &AllowedCategories {
        &self.options.allowed
    }

    pub fn helpdesk(&self) -> Arc<dyn HelpdeskClient> {
        self.helpdesk.clone()
    }

    /// The current snapshot. Stays valid even if a refresh replaces it.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        match self.snapshot.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    fn publish(&self, snapshot: Snapshot) {
        let snapshot = Arc::new(snapshot);
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }

    /// Rebuild the cache from the helpdesk.
    ///
    /// On failure the cache is left empty rather than stale. Concurrent
    /// refreshes run one after another.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<RefreshReport> {
        let _guard = self.refresh_guard.lock().await;
        info!("Starting knowledge base refresh");

        match loader::build_snapshot(self.helpdesk.as_ref(), self.embedder.as_ref(), &self.options)
            .await
        {
            Ok((snapshot, report)) => {
                info!(
                    "Knowledge base refreshed: {} articles ({} failures skipped)",
                    report.articles_cached, report.failures
                );
                self.publish(snapshot);
                Ok(report)
            }
            Err(e) => {
                error!("Knowledge base refresh failed: {}", e);
                self.publish(Snapshot::empty());
                Err(DeskbotError::RefreshFailed(e.to_string()))
            }
        }
    }

    /// Find up to `k` articles relevant to a question, most similar first.
    ///
    /// An empty cache yields no results without calling the embedder.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn search(&self, question: &str, k: usize) -> Result<Vec<RelevantArticle>> {
        let snapshot = self.snapshot();
        if snapshot.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed(question).await?;

        Ok(ranker::top_k(&query, snapshot.embeddings(), k, self.min_score)
            .into_iter()
            .map(|(i, score)| RelevantArticle::from_article(&snapshot.articles()[i], score))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{category, folder, FakeHelpdesk, KeywordEmbedder};

    fn corpus() -> FakeHelpdesk {
        FakeHelpdesk::new()
            .with_category(category(1, "Workflow"), vec![folder(10, "Orders")])
            .with_category(category(2, "General Info"), vec![folder(20, "Basics")])
            .with_category(category(3, "Internal"), vec![folder(30, "Payroll")])
            .with_published(10, 100, "Refund policy", "Refunds are issued within 30 days of the order.")
            .with_published(10, 101, "Shipping times", "We ship every order the next business day.")
            .with_draft(10, 102, "Refund policy v2")
            .with_published(20, 200, "Opening hours", "The office opens at nine.")
            .with_published(30, 300, "Refund of salaries", "Payroll refund process.")
    }

    fn knowledge_base(helpdesk: FakeHelpdesk, embedder: Arc<KeywordEmbedder>) -> KnowledgeBase {
        KnowledgeBase::new(
            Arc::new(helpdesk),
            embedder,
            AllowedCategories::new(["workflow", "general info"]),
        )
    }

    #[tokio::test]
    async fn test_search_empty_cache_returns_nothing() {
        let embedder = Arc::new(KeywordEmbedder::default());
        let kb = knowledge_base(corpus(), embedder.clone());

        let results = kb.search("refund", 3).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(embedder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_refresh_then_search() {
        let embedder = Arc::new(KeywordEmbedder::default());
        let kb = knowledge_base(corpus(), embedder);

        let report = kb.refresh().await.unwrap();
        assert_eq!(report.articles_cached, 3);

        let results = kb.search("How do I get a refund?", 3).await.unwrap();
        assert!(!results.is_empty());
        assert!(results.len() <= 3);
        assert_eq!(results[0].title, "Refund policy");
        assert!(results.iter().all(|r| r.score > DEFAULT_MIN_SCORE));
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        // the payroll article lives in a category that is not allowed
        assert!(results.iter().all(|r| r.category != "Internal"));
    }

    #[tokio::test]
    async fn test_search_with_no_relevant_articles() {
        let kb = knowledge_base(corpus(), Arc::new(KeywordEmbedder::default()));
        kb.refresh().await.unwrap();

        let results = kb.search("password reset", 3).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_cache_only_holds_published_allowed_articles() {
        let kb = knowledge_base(corpus(), Arc::new(KeywordEmbedder::default()));
        kb.refresh().await.unwrap();

        let snapshot = kb.snapshot();
        assert!(snapshot.articles().iter().all(|a| a.status == ArticleStatus::Published));
        assert!(snapshot.articles().iter().all(|a| a.id != "102" && a.id != "300"));
        assert_eq!(snapshot.embeddings().len(), snapshot.len());
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent_in_shape() {
        let kb = knowledge_base(corpus(), Arc::new(KeywordEmbedder::default()));

        kb.refresh().await.unwrap();
        let first: Vec<String> = kb.snapshot().articles().iter().map(|a| a.id.clone()).collect();

        kb.refresh().await.unwrap();
        let second: Vec<String> = kb.snapshot().articles().iter().map(|a| a.id.clone()).collect();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_failed_refresh_empties_cache() {
        let helpdesk = corpus();
        let fail_switch = helpdesk.category_failure_switch();
        let kb = knowledge_base(helpdesk, Arc::new(KeywordEmbedder::default()));

        kb.refresh().await.unwrap();
        assert_eq!(kb.snapshot().len(), 3);

        fail_switch.store(true, std::sync::atomic::Ordering::SeqCst);
        let result = kb.refresh().await;

        assert!(matches!(result, Err(DeskbotError::RefreshFailed(_))));
        assert!(kb.snapshot().is_empty());
        assert!(kb.search("refund", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_held_snapshot_survives_refresh() {
        let kb = knowledge_base(corpus(), Arc::new(KeywordEmbedder::default()));
        kb.refresh().await.unwrap();

        let held = kb.snapshot();
        kb.refresh().await.unwrap();

        assert_eq!(held.len(), 3);
        assert!(!Arc::ptr_eq(&held, &kb.snapshot()));
    }

    #[tokio::test]
    async fn test_search_during_refresh_sees_previous_snapshot() {
        let helpdesk = corpus();
        let gate = helpdesk.category_gate();
        let kb = Arc::new(knowledge_base(helpdesk, Arc::new(KeywordEmbedder::default())));
        kb.refresh().await.unwrap();
        let before = kb.snapshot();

        gate.arm();
        let refresh = tokio::spawn({
            let kb = kb.clone();
            async move { kb.refresh().await }
        });
        gate.wait_entered().await;

        let results = kb.search("refund", 3).await.unwrap();
        assert_eq!(results[0].title, "Refund policy");
        assert!(Arc::ptr_eq(&before, &kb.snapshot()));

        gate.release();
        refresh.await.unwrap().unwrap();
        assert!(!Arc::ptr_eq(&before, &kb.snapshot()));
        assert_eq!(kb.snapshot().len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_run_one_at_a_time() {
        let helpdesk = corpus();
        let gate = helpdesk.category_gate();
        gate.arm();
        let kb = Arc::new(knowledge_base(helpdesk, Arc::new(KeywordEmbedder::default())));

        let spawn_refresh = |kb: Arc<KnowledgeBase>| tokio::spawn(async move { kb.refresh().await });
        let first = spawn_refresh(kb.clone());
        let second = spawn_refresh(kb.clone());

        gate.wait_entered().await;
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        // the second refresh waits on the guard, not at the helpdesk
        assert_eq!(gate.entries(), 1);

        gate.release();
        gate.wait_entered().await;
        gate.release();

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();
        assert_eq!(gate.entries(), 2);
        assert_eq!(gate.max_active(), 1);
        assert_eq!(kb.snapshot().len(), 3);
    }

    #[test]
    fn test_allowed_categories_case_insensitive() {
        let allowed = AllowedCategories::default();
        assert!(allowed.contains("general info"));
        assert!(allowed.contains("  TRAINING PROGRAMME (CUSTOMER SUCCESS) "));
        assert!(!allowed.contains("General"));
    }

    #[test]
    fn test_snapshot_rejects_misaligned_embeddings() {
        let article = Article {
            id: "1".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            url: "u".to_string(),
            category: "c".to_string(),
            folder: "f".to_string(),
            status: ArticleStatus::Published,
            created_at: None,
            updated_at: None,
        };

        assert!(Snapshot::new(vec![article], vec![]).is_err());
    }
}
