//! Google Books Client - 调用 Google Books volumes API
//!
//! 实现 BookSearchPort trait
//!
//! 外部 API:
//! GET https://www.googleapis.com/books/v1/volumes?q=...&maxResults=...
//! GET https://www.googleapis.com/books/v1/volumes?q=isbn:9780544003415

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::application::ports::{normalize_isbn, BookSearchError, BookSearchPort};
use crate::domain::library::{BookDetails, BookInfo};

const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Google Books 客户端配置
#[derive(Debug, Clone)]
pub struct GoogleBooksConfig {
    /// volumes 接口地址
    pub base_url: String,
    pub api_key: Option<String>,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 单次请求允许的最大结果数
    pub max_results_limit: u32,
    /// 网络错误或超时时的重试次数
    pub max_retries: u32,
}

impl Default for GoogleBooksConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/books/v1/volumes".to_string(),
            api_key: None,
            timeout_secs: 10,
            max_results_limit: 40,
            max_retries: 1,
        }
    }
}

impl GoogleBooksConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

// ============================================================================
// API payload
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    volume_info: Option<VolumeInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    publisher: Option<String>,
    published_date: Option<String>,
    description: Option<String>,
    #[serde(default)]
    industry_identifiers: Vec<IndustryIdentifier>,
    page_count: Option<i32>,
    #[serde(default)]
    categories: Vec<String>,
    image_links: Option<ImageLinks>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

#[derive(Debug, Default, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
    small: Option<String>,
    medium: Option<String>,
    large: Option<String>,
}

/// 将单个 volume 转为 BookInfo，缺少书名或校验失败时跳过
fn volume_to_book_info(info: VolumeInfo) -> Option<BookInfo> {
    let title = info.title.filter(|t| !t.trim().is_empty())?;

    let author = if info.authors.is_empty() {
        UNKNOWN_AUTHOR.to_string()
    } else {
        info.authors.join(", ")
    };

    let isbn = info
        .industry_identifiers
        .iter()
        .find(|id| id.kind == "ISBN_13" || id.kind == "ISBN_10")
        .map(|id| id.identifier.clone());

    // publishedDate 形如 "1937"、"1937-09"、"1937-09-21"
    let publication_year = info
        .published_date
        .as_deref()
        .and_then(|d| d.get(..4))
        .and_then(|y| y.parse::<i32>().ok());

    let cover_image_url = info.image_links.and_then(|links| {
        links
            .medium
            .or(links.small)
            .or(links.thumbnail)
            .or(links.large)
    });

    let details = BookDetails {
        title,
        author,
        isbn,
        publisher: info.publisher,
        publication_year,
        total_pages: info.page_count.filter(|p| *p > 0),
        genre: info.categories.into_iter().next(),
        description: info.description,
        cover_image_url,
    };

    match BookInfo::new(details) {
        Ok(book) => Some(book),
        Err(e) => {
            tracing::debug!(error = %e, "Skipping invalid volume");
            None
        }
    }
}

fn parse_volumes(body: &str) -> Result<Vec<BookInfo>, BookSearchError> {
    let response: VolumesResponse = serde_json::from_str(body)
        .map_err(|e| BookSearchError::InvalidResponse(e.to_string()))?;

    Ok(response
        .items
        .into_iter()
        .filter_map(|item| item.volume_info)
        .filter_map(volume_to_book_info)
        .collect())
}

/// Google Books 客户端
pub struct GoogleBooksClient {
    client: Client,
    config: GoogleBooksConfig,
}

impl GoogleBooksClient {
    pub fn new(config: GoogleBooksConfig) -> Result<Self, BookSearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BookSearchError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn with_default_config() -> Result<Self, BookSearchError> {
        Self::new(GoogleBooksConfig::default())
    }

    /// 发送查询并解析结果，网络错误和超时按配置重试
    async fn fetch_volumes(&self, q: &str, max_results: u32) -> Result<Vec<BookInfo>, BookSearchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(q, max_results).await {
                Err(e @ (BookSearchError::Timeout | BookSearchError::NetworkError(_)))
                    if attempt < self.config.max_retries =>
                {
                    attempt += 1;
                    tracing::warn!(attempt = attempt, error = %e, "Google Books request failed, retrying");
                }
                result => return result,
            }
        }
    }

    async fn fetch_once(&self, q: &str, max_results: u32) -> Result<Vec<BookInfo>, BookSearchError> {
        let mut params = vec![
            ("q", q.to_string()),
            ("maxResults", max_results.to_string()),
        ];
        if let Some(key) = &self.config.api_key {
            params.push(("key", key.clone()));
        }

        tracing::debug!(url = %self.config.base_url, q = %q, max_results = max_results, "Sending Google Books request");

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BookSearchError::Timeout
                } else if e.is_connect() {
                    BookSearchError::NetworkError(format!("Cannot connect to Google Books: {}", e))
                } else {
                    BookSearchError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(BookSearchError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| BookSearchError::InvalidResponse(format!("Failed to read body: {}", e)))?;

        parse_volumes(&body)
    }
}

#[async_trait]
impl BookSearchPort for GoogleBooksClient {
    async fn search_books(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<BookInfo>, BookSearchError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let max_results = max_results.clamp(1, self.config.max_results_limit.max(1));
        let books = self.fetch_volumes(query, max_results).await?;

        tracing::info!(query = %query, found = books.len(), "Google Books search completed");
        Ok(books)
    }

    async fn get_book_by_isbn(&self, isbn: &str) -> Result<Option<BookInfo>, BookSearchError> {
        let isbn = normalize_isbn(isbn);
        if isbn.is_empty() {
            return Ok(None);
        }

        let book = self
            .fetch_volumes(&format!("isbn:{}", isbn), 1)
            .await?
            .into_iter()
            .next();

        tracing::info!(isbn = %isbn, found = book.is_some(), "Google Books ISBN lookup completed");
        Ok(book)
    }
}
