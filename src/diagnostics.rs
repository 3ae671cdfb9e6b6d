//! Helpdesk and cache diagnostics.

use crate::error::Result;
use crate::helpdesk::{ArticleDetail, Category, Folder, FolderVisibility, HelpdeskClient};
use crate::knowledge_base::{AllowedCategories, Snapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use tracing::{instrument, warn};

/// One category and the folders visible in it.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDiagnostic {
    pub category: Category,
    pub allowed: bool,
    /// Folders, or the error returned while listing them.
    pub folders: std::result::Result<Vec<Folder>, String>,
}

/// Result of walking the helpdesk's categories and folders.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub categories: Vec<CategoryDiagnostic>,
}

impl DiagnosticReport {
    pub fn render(&self) -> String {
        let mut out = format!("Found {} categories\n", self.categories.len());

        for diag in &self.categories {
            let marker = if diag.allowed { "✅" } else { "⏩" };
            let _ = write!(
                out,
                "\n{} Category: {} (ID: {})\n",
                marker, diag.category.name, diag.category.id
            );

            match &diag.folders {
                Ok(folders) if folders.is_empty() => out.push_str("  - No folders found\n"),
                Ok(folders) => {
                    for folder in folders {
                        let _ = writeln!(out, "  - {} (ID: {})", folder.name, folder.id);
                        let _ = writeln!(
                            out,
                            "    Visibility: {}",
                            folder
                                .visibility
                                .map(|v| v.to_string())
                                .unwrap_or_else(|| "Not specified".to_string())
                        );
                        let _ = writeln!(
                            out,
                            "    Articles Count: {}",
                            folder
                                .articles_count
                                .map(|c| c.to_string())
                                .unwrap_or_else(|| "Not specified".to_string())
                        );
                        if let Some(ids) = folder.company_ids.as_ref().filter(|ids| !ids.is_empty()) {
                            let _ = writeln!(out, "    Restricted to companies: {:?}", ids);
                        }
                    }
                }
                Err(e) => {
                    let _ = writeln!(out, "  ❌ Error listing folders: {}", e);
                }
            }
        }

        out
    }
}

/// List every category (allowed or not) with its folders.
///
/// Fails only if the category list itself cannot be fetched.
#[instrument(skip_all)]
pub async fn diagnose(
    helpdesk: &dyn HelpdeskClient,
    allowed: &AllowedCategories,
) -> Result<DiagnosticReport> {
    let categories = helpdesk.list_categories().await?;
    let mut report = DiagnosticReport {
        categories: Vec::with_capacity(categories.len()),
    };

    for category in categories {
        let folders = helpdesk
            .list_folders(category.id)
            .await
            .map_err(|e| e.to_string());
        report.categories.push(CategoryDiagnostic {
            allowed: allowed.contains(&category.name),
            category,
            folders,
        });
    }

    Ok(report)
}

/// Cached article titles grouped by category.
#[derive(Debug, Clone, Serialize)]
pub struct CacheSummary {
    pub total: usize,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
    pub name: String,
    /// `(id, title)` pairs in cache order.
    pub articles: Vec<(String, String)>,
}

impl CacheSummary {
    pub fn render(&self) -> String {
        let mut out = format!("Total articles in cache: {}\n", self.total);
        if let Some(at) = self.refreshed_at {
            let _ = writeln!(out, "Last refreshed: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        for category in &self.categories {
            let _ = write!(
                out,
                "\nCategory: {}\nNumber of articles: {}\n",
                category.name,
                category.articles.len()
            );
            for (id, title) in &category.articles {
                let _ = writeln!(out, "  - {} (ID: {})", title, id);
            }
        }
        out
    }
}

pub fn summarize_cache(snapshot: &Snapshot) -> CacheSummary {
    CacheSummary {
        total: snapshot.len(),
        refreshed_at: snapshot.refreshed_at(),
        categories: snapshot
            .by_category()
            .into_iter()
            .map(|(name, articles)| CategorySummary {
                name: name.to_string(),
                articles: articles
                    .into_iter()
                    .map(|a| (a.id.clone(), a.title.clone()))
                    .collect(),
            })
            .collect(),
    }
}

/// A single article looked up directly, with its location resolved.
#[derive(Debug, Clone, Serialize)]
pub struct ArticleCheck {
    pub article: ArticleDetail,
    pub url: String,
    pub category: Option<Category>,
    pub folder: Option<Folder>,
    /// Whether the article is in the current cache, when known.
    pub cached: Option<bool>,
}

impl ArticleCheck {
    pub fn render(&self) -> String {
        let mut out = String::from("✅ Article exists!\n");
        let _ = writeln!(out, "Title: {}", self.article.title);
        let _ = writeln!(out, "Status: {}", self.article.status);
        let _ = writeln!(out, "URL: {}", self.url);
        if let Some(category) = &self.category {
            let _ = writeln!(out, "Category: {} (ID: {})", category.name, category.id);
        }
        if let Some(folder) = &self.folder {
            let _ = writeln!(out, "Folder: {} (ID: {})", folder.name, folder.id);
            if let Some(visibility) = folder.visibility {
                let _ = writeln!(out, "Folder Visibility: {}", visibility);
            }
        }
        if let Some(cached) = self.cached {
            let _ = writeln!(out, "In cache: {}", if cached { "yes" } else { "no" });
        }
        out.trim_end().to_string()
    }
}

/// Fetch an article and resolve its category and folder names.
#[instrument(skip(helpdesk))]
pub async fn check_article(helpdesk: &dyn HelpdeskClient, article_id: u64) -> Result<ArticleCheck> {
    let article = helpdesk.get_article(article_id).await?;

    let category = match article.category_id {
        Some(id) => helpdesk
            .get_category(id)
            .await
            .map_err(|e| warn!("Failed to resolve category {}: {}", id, e))
            .ok(),
        None => None,
    };

    let folder = match article.folder_id {
        Some(id) => helpdesk
            .get_folder(id)
            .await
            .map_err(|e| warn!("Failed to resolve folder {}: {}", id, e))
            .ok(),
        None => None,
    };

    Ok(ArticleCheck {
        url: helpdesk.article_url(article_id),
        article,
        category,
        folder,
        cached: None,
    })
}

/// A folder visibility update.
#[derive(Debug, Clone, Serialize)]
pub struct VisibilityChange {
    pub folder_id: u64,
    pub folder_name: String,
    pub before: Option<FolderVisibility>,
    pub after: Option<FolderVisibility>,
}

impl VisibilityChange {
    pub fn render(&self) -> String {
        let show = |v: Option<FolderVisibility>| {
            v.map(|v| v.to_string())
                .unwrap_or_else(|| "Not specified".to_string())
        };
        format!(
            "Folder: {} (ID: {})\nVisibility: {} -> {}",
            self.folder_name,
            self.folder_id,
            show(self.before),
            show(self.after)
        )
    }
}

/// Read a folder's current visibility, then set it.
#[instrument(skip(helpdesk))]
pub async fn update_folder_visibility(
    helpdesk: &dyn HelpdeskClient,
    folder_id: u64,
    visibility: FolderVisibility,
) -> Result<VisibilityChange> {
    let current = helpdesk.get_folder(folder_id).await?;
    let updated = helpdesk.set_folder_visibility(folder_id, visibility).await?;

    Ok(VisibilityChange {
        folder_id,
        folder_name: current.name,
        before: current.visibility,
        after: updated.visibility,
    })
}
