//! Snapshot construction: walks the helpdesk hierarchy and embeds the result.

use super::{AllowedCategories, Article, RefreshReport, Snapshot};
use crate::embedding::Embedder;
use crate::error::{DeskbotError, Result};
use crate::helpdesk::{ArticleStatus, ArticleSummary, HelpdeskClient};
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use tracing::{debug, info, instrument, warn};

/// Options controlling a knowledge base walk.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    pub allowed: AllowedCategories,
    pub page_size: u32,
    pub fetch_concurrency: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            allowed: AllowedCategories::default(),
            page_size: 30,
            fetch_concurrency: 4,
        }
    }
}

/// Articles listed from one folder.
#[derive(Debug)]
pub struct FolderListing {
    pub articles: Vec<ArticleSummary>,
    pub pages_requested: u32,
    /// Set when a page request failed; pages before it are kept.
    pub error: Option<DeskbotError>,
}

/// List every article in a folder, one page at a time.
///
/// A page shorter than `per_page` (including an empty one) ends the listing.
pub async fn fetch_folder_articles(
    helpdesk: &dyn HelpdeskClient,
    folder_id: u64,
    per_page: u32,
) -> FolderListing {
    let per_page = per_page.max(1);
    let mut articles = Vec::new();
    let mut page = 1;
    let mut pages_requested = 0;

    loop {
        pages_requested += 1;
        match helpdesk.list_articles(folder_id, page, per_page).await {
            Ok(batch) => {
                let count = batch.len();
                debug!("Folder {} page {}: {} articles", folder_id, page, count);
                articles.extend(batch);

                if count < per_page as usize {
                    break;
                }
                page += 1;
            }
            Err(e) => {
                return FolderListing {
                    articles,
                    pages_requested,
                    error: Some(e),
                };
            }
        }
    }

    FolderListing {
        articles,
        pages_requested,
        error: None,
    }
}

/// Build a complete snapshot.
///
/// Fails only when the category list cannot be fetched or embedding fails;
/// folder and article failures are logged and skipped.
#[instrument(skip_all)]
pub async fn build_snapshot(
    helpdesk: &dyn HelpdeskClient,
    embedder: &dyn Embedder,
    options: &LoaderOptions,
) -> Result<(Snapshot, RefreshReport)> {
    let categories = helpdesk.list_categories().await?;
    info!("Found {} categories", categories.len());

    let mut report = RefreshReport::default();
    let mut articles: Vec<Article> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for category in &categories {
        let category_name = category.name.trim();

        if !options.allowed.contains(category_name) {
            info!("Skipping category '{}': not in allowed list", category_name);
            report.categories_skipped += 1;
            continue;
        }
        report.categories_visited += 1;

        let folders = match helpdesk.list_folders(category.id).await {
            Ok(folders) => folders,
            Err(e) => {
                warn!("Failed to list folders of '{}': {}", category_name, e);
                report.failures += 1;
                continue;
            }
        };

        if folders.is_empty() {
            warn!("No folders found in category '{}'", category_name);
            continue;
        }

        for folder in &folders {
            report.folders_visited += 1;

            let listing = fetch_folder_articles(helpdesk, folder.id, options.page_size).await;
            if let Some(e) = &listing.error {
                warn!(
                    "Listing folder '{}' stopped after {} pages: {}",
                    folder.name, listing.pages_requested, e
                );
                report.failures += 1;
            }

            if listing.articles.is_empty() {
                debug!("No articles found in folder '{}'", folder.name);
                continue;
            }

            let mut published = Vec::with_capacity(listing.articles.len());
            for summary in listing.articles {
                if summary.status != ArticleStatus::Published {
                    debug!("Skipping '{}': {}", summary.title, summary.status);
                    report.unpublished_skipped += 1;
                } else if seen.contains(&summary.id.to_string()) {
                    report.duplicates_skipped += 1;
                } else {
                    published.push(summary);
                }
            }

            // ids by value so the refresh future stays Send
            let ids: Vec<u64> = published.iter().map(|s| s.id).collect();
            // buffered() yields in listing order
            let details: Vec<_> = stream::iter(ids)
                .map(|id| helpdesk.get_article(id))
                .buffered(options.fetch_concurrency.max(1))
                .collect()
                .await;

            for (summary, detail) in published.iter().zip(details) {
                let detail = match detail {
                    Ok(detail) => detail,
                    Err(e) => {
                        warn!("Failed to fetch article {}: {}", summary.id, e);
                        report.failures += 1;
                        continue;
                    }
                };

                if detail.status != ArticleStatus::Published {
                    report.unpublished_skipped += 1;
                    continue;
                }

                let id = summary.id.to_string();
                if !seen.insert(id.clone()) {
                    warn!("Duplicate article {} in folder '{}', keeping first", id, folder.name);
                    report.duplicates_skipped += 1;
                    continue;
                }

                articles.push(Article {
                    id,
                    title: detail.title,
                    description: detail.description_text,
                    url: helpdesk.article_url(summary.id),
                    category: category_name.to_string(),
                    folder: folder.name.clone(),
                    status: detail.status,
                    created_at: detail.created_at,
                    updated_at: detail.updated_at,
                });
            }
        }
    }

    report.articles_cached = articles.len();

    let embeddings = if articles.is_empty() {
        warn!("No articles were cached");
        Vec::new()
    } else {
        info!("Creating embeddings for {} articles", articles.len());
        let texts: Vec<String> = articles.iter().map(Article::embedding_text).collect();
        embedder.embed_batch(&texts).await?
    };

    let snapshot = Snapshot::new(articles, embeddings)?;

    for article in snapshot.most_recent(5) {
        info!(
            "Recent: {} (updated {})",
            article.title,
            article
                .updated_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string())
        );
    }

    Ok((snapshot, report))
}
