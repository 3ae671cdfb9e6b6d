//! Freshdesk API v2 client.

use super::{
    ArticleDetail, ArticleSummary, Category, Folder, FolderVisibility, HelpdeskClient,
};
use crate::config::HelpdeskSettings;
use crate::error::{DeskbotError, Result};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Freshdesk solutions client using HTTP basic auth (`api_key:X`).
pub struct FreshdeskClient {
    http: reqwest::Client,
    base_url: String,
    portal_url: String,
    api_key: String,
}

impl FreshdeskClient {
    /// Create a client for an explicit API base URL and portal URL.
    pub fn new(base_url: &str, portal_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Url::parse(base_url)
            .map_err(|e| DeskbotError::Config(format!("Invalid helpdesk URL '{}': {}", base_url, e)))?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeskbotError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            portal_url: portal_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Create a client from helpdesk settings.
    pub fn from_settings(settings: &HelpdeskSettings) -> Result<Self> {
        if settings.domain.is_empty() && settings.base_url.is_none() {
            return Err(DeskbotError::Config(
                "Helpdesk domain not set. Set FRESHDESK_DOMAIN or helpdesk.domain".to_string(),
            ));
        }

        let api_key = settings
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                DeskbotError::Config(
                    "Helpdesk API key not set. Set FRESHDESK_API_KEY or helpdesk.api_key".to_string(),
                )
            })?;

        Self::new(
            &settings.api_base_url(),
            &settings.portal_url(),
            api_key,
            Duration::from_secs(settings.timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.api_key, Some("X"))
            .query(query)
            .send()
            .await?;

        let response = check_status(response, &url)?;
        Ok(response.json::<T>().await?)
    }
}

/// Map a non-success response to the matching error variant.
fn check_status(response: Response, url: &str) -> Result<Response> {
    let status = response.status();

    if let Some(remaining) = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
    {
        debug!("Rate limit remaining: {}", remaining);
    }

    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            warn!("Authentication failed for {}", url);
            Err(DeskbotError::Unauthorized)
        }
        StatusCode::NOT_FOUND => Err(DeskbotError::NotFound(url.to_string())),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            warn!("Rate limited on {} (retry after {:?})", url, retry_after);
            Err(DeskbotError::RateLimited { retry_after })
        }
        _ => Err(DeskbotError::Helpdesk {
            status: status.as_u16(),
            url: url.to_string(),
        }),
    }
}

#[async_trait]
impl HelpdeskClient for FreshdeskClient {
    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>> {
        self.get_json("/solutions/categories", &[]).await
    }

    #[instrument(skip(self))]
    async fn get_category(&self, category_id: u64) -> Result<Category> {
        self.get_json(&format!("/solutions/categories/{}", category_id), &[])
            .await
    }

    #[instrument(skip(self))]
    async fn list_folders(&self, category_id: u64) -> Result<Vec<Folder>> {
        self.get_json(&format!("/solutions/categories/{}/folders", category_id), &[])
            .await
    }

    #[instrument(skip(self))]
    async fn get_folder(&self, folder_id: u64) -> Result<Folder> {
        self.get_json(&format!("/solutions/folders/{}", folder_id), &[])
            .await
    }

    #[instrument(skip(self))]
    async fn list_articles(
        &self,
        folder_id: u64,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<ArticleSummary>> {
        self.get_json(
            &format!("/solutions/folders/{}/articles", folder_id),
            &[("page", page.to_string()), ("per_page", per_page.to_string())],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn get_article(&self, article_id: u64) -> Result<ArticleDetail> {
        self.get_json(&format!("/solutions/articles/{}", article_id), &[])
            .await
    }

    #[instrument(skip(self))]
    async fn set_folder_visibility(
        &self,
        folder_id: u64,
        visibility: FolderVisibility,
    ) -> Result<Folder> {
        let url = self.url(&format!("/solutions/folders/{}", folder_id));
        let response = self
            .http
            .put(&url)
            .basic_auth(&self.api_key, Some("X"))
            .json(&serde_json::json!({ "visibility": u8::from(visibility) }))
            .send()
            .await?;

        let response = check_status(response, &url)?;
        Ok(response.json::<Folder>().await?)
    }

    fn article_url(&self, article_id: u64) -> String {
        format!("{}/a/solutions/articles/{}", self.portal_url, article_id)
    }
}
