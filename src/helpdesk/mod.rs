//! Helpdesk abstraction for Deskbot.
//!
//! Provides a trait-based interface over the helpdesk's solution hierarchy
//! (categories, folders, articles) and a Freshdesk implementation.

mod freshdesk;

pub use freshdesk::FreshdeskClient;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Publication state of a helpdesk article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ArticleStatus {
    Draft,
    Published,
    /// A status code this crate does not know about.
    Other(u8),
}

impl From<u8> for ArticleStatus {
    fn from(code: u8) -> Self {
        match code {
            1 => ArticleStatus::Draft,
            2 => ArticleStatus::Published,
            other => ArticleStatus::Other(other),
        }
    }
}

impl From<ArticleStatus> for u8 {
    fn from(status: ArticleStatus) -> Self {
        match status {
            ArticleStatus::Draft => 1,
            ArticleStatus::Published => 2,
            ArticleStatus::Other(code) => code,
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleStatus::Draft => write!(f, "draft"),
            ArticleStatus::Published => write!(f, "published"),
            ArticleStatus::Other(code) => write!(f, "status {}", code),
        }
    }
}

/// Who can see a solution folder in the customer portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum FolderVisibility {
    AllUsers,
    LoggedInUsers,
    Agents,
    SelectedCompanies,
    Other(u8),
}

impl From<u8> for FolderVisibility {
    fn from(code: u8) -> Self {
        match code {
            1 => FolderVisibility::AllUsers,
            2 => FolderVisibility::LoggedInUsers,
            3 => FolderVisibility::Agents,
            4 => FolderVisibility::SelectedCompanies,
            other => FolderVisibility::Other(other),
        }
    }
}

impl From<FolderVisibility> for u8 {
    fn from(visibility: FolderVisibility) -> Self {
        match visibility {
            FolderVisibility::AllUsers => 1,
            FolderVisibility::LoggedInUsers => 2,
            FolderVisibility::Agents => 3,
            FolderVisibility::SelectedCompanies => 4,
            FolderVisibility::Other(code) => code,
        }
    }
}

impl fmt::Display for FolderVisibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolderVisibility::AllUsers => write!(f, "all users"),
            FolderVisibility::LoggedInUsers => write!(f, "logged-in users"),
            FolderVisibility::Agents => write!(f, "agents"),
            FolderVisibility::SelectedCompanies => write!(f, "selected companies"),
            FolderVisibility::Other(code) => write!(f, "visibility {}", code),
        }
    }
}

impl std::str::FromStr for FolderVisibility {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], " ").trim() {
            "all" | "all users" | "1" => Ok(FolderVisibility::AllUsers),
            "logged in" | "logged in users" | "2" => Ok(FolderVisibility::LoggedInUsers),
            "agents" | "3" => Ok(FolderVisibility::Agents),
            "selected companies" | "companies" | "4" => Ok(FolderVisibility::SelectedCompanies),
            _ => Err(format!("Unknown folder visibility: {}", s)),
        }
    }
}

/// A solution category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A solution folder within a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub visibility: Option<FolderVisibility>,
    #[serde(default)]
    pub articles_count: Option<u32>,
    /// Companies the folder is restricted to, if any.
    #[serde(default)]
    pub company_ids: Option<Vec<u64>>,
}

/// An article as returned by a folder listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    pub status: ArticleStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A fully fetched article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleDetail {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    /// Plain-text body.
    #[serde(default)]
    pub description_text: String,
    pub status: ArticleStatus,
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub folder_id: Option<u64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Trait for helpdesk knowledge-base clients.
///
/// Implementations distinguish authentication failures, missing resources
/// and rate limiting through the corresponding error variants.
#[async_trait]
pub trait HelpdeskClient: Send + Sync {
    /// List all solution categories.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Get a single category.
    async fn get_category(&self, category_id: u64) -> Result<Category>;

    /// List the folders of a category.
    async fn list_folders(&self, category_id: u64) -> Result<Vec<Folder>>;

    /// Get a single folder.
    async fn get_folder(&self, folder_id: u64) -> Result<Folder>;

    /// List one page (1-based) of a folder's articles.
    async fn list_articles(
        &self,
        folder_id: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<ArticleSummary>>;

    /// Get an article with its full content.
    async fn get_article(&self, article_id: u64) -> Result<ArticleDetail>;

    /// Change who can see a folder. Returns the updated folder.
    async fn set_folder_visibility(
        &self,
        folder_id: u64,
        visibility: FolderVisibility,
    ) -> Result<Folder>;

    /// Public URL of an article.
    fn article_url(&self, article_id: u64) -> String;
}
