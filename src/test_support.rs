//! In-process fakes for the helpdesk, embedder and completion client.

use crate::embedding::Embedder;
use crate::error::{DeskbotError, Result};
use crate::helpdesk::{
    ArticleDetail, ArticleStatus, ArticleSummary, Category, Folder, FolderVisibility,
    HelpdeskClient,
};
use crate::rag::{Completer, CompletionRequest};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn category(id: u64, name: &str) -> Category {
    Category {
        id,
        name: name.to_string(),
        description: None,
    }
}

pub fn folder(id: u64, name: &str) -> Folder {
    Folder {
        id,
        name: name.to_string(),
        visibility: Some(FolderVisibility::AllUsers),
        articles_count: None,
        company_ids: None,
    }
}

/// `count` published summaries with consecutive ids starting at `first_id`.
pub fn summaries(first_id: u64, count: u64) -> Vec<ArticleSummary> {
    (first_id..first_id + count)
        .map(|id| ArticleSummary {
            id,
            title: format!("Article {}", id),
            status: ArticleStatus::Published,
            created_at: None,
            updated_at: None,
        })
        .collect()
}

/// Holds `list_categories` until released, once armed.
#[derive(Default)]
pub struct CategoryGate {
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
    entries: AtomicUsize,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl CategoryGate {
    pub fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    /// Wait until a caller is parked at the gate.
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let one parked caller through.
    pub fn release(&self) {
        self.release.notify_one();
    }

    /// Callers that reached the gate while armed.
    pub fn entries(&self) -> usize {
        self.entries.load(Ordering::SeqCst)
    }

    /// Most callers ever parked at the same time.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    async fn pass(&self) {
        if !self.armed.load(Ordering::SeqCst) {
            return;
        }
        self.entries.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Scripted helpdesk that counts its calls.
#[derive(Default)]
pub struct FakeHelpdesk {
    categories: Vec<Category>,
    folders: HashMap<u64, Vec<Folder>>,
    pages: HashMap<u64, Vec<Vec<ArticleSummary>>>,
    articles: HashMap<u64, ArticleDetail>,
    fail_categories: Arc<AtomicBool>,
    category_gate: Arc<CategoryGate>,
    failing_folder_lists: HashSet<u64>,
    failing_pages: HashSet<(u64, u32)>,
    failing_articles: HashSet<u64>,
    list_calls: Mutex<HashMap<u64, u32>>,
    article_calls: Mutex<HashMap<u64, u32>>,
    visibility: Mutex<HashMap<u64, FolderVisibility>>,
}

impl FakeHelpdesk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: Category, folders: Vec<Folder>) -> Self {
        self.folders.insert(category.id, folders);
        self.categories.push(category);
        self
    }

    pub fn with_pages(mut self, folder_id: u64, pages: Vec<Vec<ArticleSummary>>) -> Self {
        self.pages.insert(folder_id, pages);
        self
    }

    fn with_article(mut self, folder_id: u64, id: u64, title: &str, body: &str, status: ArticleStatus) -> Self {
        let pages = self.pages.entry(folder_id).or_default();
        if pages.is_empty() {
            pages.push(Vec::new());
        }
        if let Some(last) = pages.last_mut() {
            last.push(ArticleSummary {
                id,
                title: title.to_string(),
                status,
                created_at: None,
                updated_at: None,
            });
        }

        self.articles.insert(
            id,
            ArticleDetail {
                id,
                title: title.to_string(),
                description_text: body.to_string(),
                status,
                category_id: None,
                folder_id: Some(folder_id),
                created_at: None,
                updated_at: None,
            },
        );
        self
    }

    pub fn with_published(self, folder_id: u64, id: u64, title: &str, body: &str) -> Self {
        self.with_article(folder_id, id, title, body, ArticleStatus::Published)
    }

    pub fn with_draft(self, folder_id: u64, id: u64, title: &str) -> Self {
        self.with_article(folder_id, id, title, "", ArticleStatus::Draft)
    }

    pub fn failing_categories(self) -> Self {
        self.fail_categories.store(true, Ordering::SeqCst);
        self
    }

    /// Flips category listing into failure after construction.
    pub fn category_failure_switch(&self) -> Arc<AtomicBool> {
        self.fail_categories.clone()
    }

    pub fn category_gate(&self) -> Arc<CategoryGate> {
        self.category_gate.clone()
    }

    pub fn failing_folders(mut self, category_id: u64) -> Self {
        self.failing_folder_lists.insert(category_id);
        self
    }

    pub fn failing_page(mut self, folder_id: u64, page: u32) -> Self {
        self.failing_pages.insert((folder_id, page));
        self
    }

    pub fn failing_article(mut self, article_id: u64) -> Self {
        self.failing_articles.insert(article_id);
        self
    }

    pub fn list_calls(&self, folder_id: u64) -> u32 {
        self.list_calls.lock().unwrap().get(&folder_id).copied().unwrap_or(0)
    }

    pub fn article_calls(&self, article_id: u64) -> u32 {
        self.article_calls.lock().unwrap().get(&article_id).copied().unwrap_or(0)
    }
}

#[async_trait]
impl HelpdeskClient for FakeHelpdesk {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.category_gate.pass().await;
        if self.fail_categories.load(Ordering::SeqCst) {
            return Err(DeskbotError::Unauthorized);
        }
        Ok(self.categories.clone())
    }

    async fn get_category(&self, category_id: u64) -> Result<Category> {
        self.categories
            .iter()
            .find(|c| c.id == category_id)
            .cloned()
            .ok_or_else(|| DeskbotError::NotFound(format!("category {}", category_id)))
    }

    async fn list_folders(&self, category_id: u64) -> Result<Vec<Folder>> {
        if self.failing_folder_lists.contains(&category_id) {
            return Err(DeskbotError::Helpdesk {
                status: 500,
                url: format!("/solutions/categories/{}/folders", category_id),
            });
        }
        Ok(self.folders.get(&category_id).cloned().unwrap_or_default())
    }

    async fn get_folder(&self, folder_id: u64) -> Result<Folder> {
        let mut folder = self
            .folders
            .values()
            .flatten()
            .find(|f| f.id == folder_id)
            .cloned()
            .ok_or_else(|| DeskbotError::NotFound(format!("folder {}", folder_id)))?;

        if let Some(visibility) = self.visibility.lock().unwrap().get(&folder_id) {
            folder.visibility = Some(*visibility);
        }
        Ok(folder)
    }

    async fn list_articles(&self, folder_id: u64, page: u32, _per_page: u32) -> Result<Vec<ArticleSummary>> {
        *self.list_calls.lock().unwrap().entry(folder_id).or_insert(0) += 1;

        if self.failing_pages.contains(&(folder_id, page)) {
            return Err(DeskbotError::RateLimited { retry_after: Some(1) });
        }

        Ok(self
            .pages
            .get(&folder_id)
            .and_then(|pages| pages.get(page as usize - 1))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_article(&self, article_id: u64) -> Result<ArticleDetail> {
        *self.article_calls.lock().unwrap().entry(article_id).or_insert(0) += 1;

        if self.failing_articles.contains(&article_id) {
            return Err(DeskbotError::Helpdesk {
                status: 503,
                url: format!("/solutions/articles/{}", article_id),
            });
        }

        self.articles
            .get(&article_id)
            .cloned()
            .ok_or_else(|| DeskbotError::NotFound(format!("article {}", article_id)))
    }

    async fn set_folder_visibility(&self, folder_id: u64, visibility: FolderVisibility) -> Result<Folder> {
        self.visibility.lock().unwrap().insert(folder_id, visibility);
        self.get_folder(folder_id).await
    }

    fn article_url(&self, article_id: u64) -> String {
        format!("https://acme.freshdesk.com/a/solutions/articles/{}", article_id)
    }
}

const VOCABULARY: &[&str] = &[
    "refund", "order", "ship", "open", "hours", "gift", "training", "invoice", "payroll",
];

/// Deterministic bag-of-words embedder over a tiny vocabulary.
#[derive(Default)]
pub struct KeywordEmbedder {
    calls: AtomicUsize,
    batches: Mutex<Vec<Vec<String>>>,
    fail: bool,
    max_input_chars: Option<usize>,
}

impl KeywordEmbedder {
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Reject any batch holding a text longer than `chars`, like the real API.
    pub fn with_max_input(mut self, chars: usize) -> Self {
        self.max_input_chars = Some(chars);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let text = text.to_lowercase();
        VOCABULARY
            .iter()
            .map(|word| text.matches(word).count() as f32)
            .collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.embed_batch(&[text.to_string()]).await?;
        batch
            .pop()
            .ok_or_else(|| DeskbotError::Embedding("empty batch".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DeskbotError::Embedding("embedding service unavailable".to_string()));
        }
        if let Some(limit) = self.max_input_chars {
            if let Some(text) = texts.iter().find(|t| t.chars().count() > limit) {
                return Err(DeskbotError::OpenAI(format!(
                    "input of {} characters exceeds the model limit",
                    text.chars().count()
                )));
            }
        }
        self.batches.lock().unwrap().push(texts.to_vec());
        Ok(texts.iter().map(|t| Self::vectorize(t)).collect())
    }
}

/// Completion client returning a canned answer or error.
pub struct FakeCompleter {
    response: std::result::Result<String, String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeCompleter {
    pub fn answering(text: &str) -> Self {
        Self {
            response: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Completer for FakeCompleter {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.response
            .clone()
            .map_err(DeskbotError::Completion)
    }
}
