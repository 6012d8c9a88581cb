//! Wire shapes for the JSON API. Kept separate from the domain models so a
//! field rename in `Document` doesn't silently change the API contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Document, SearchHit};

#[derive(Debug, Serialize)]
pub struct LinkSummary {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub hidden: bool,
    pub added_at: DateTime<Utc>,
    pub crawled_at: Option<DateTime<Utc>>,
}

impl From<&Document> for LinkSummary {
    fn from(d: &Document) -> Self {
        Self {
            id: d.id.clone(),
            url: d.url.clone(),
            title: d.title.clone(),
            description: d.description.clone(),
            hidden: d.hidden,
            added_at: d.added_at,
            crawled_at: d.crawled_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LinkDetails {
    pub id: String,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<String>,
    pub hidden: bool,
    pub added_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub crawled_at: Option<DateTime<Utc>>,
    pub http_status: Option<i64>,
    pub crawl_error: Option<String>,
    pub has_embedding: bool,
}

impl From<Document> for LinkDetails {
    fn from(d: Document) -> Self {
        Self {
            id: d.id,
            url: d.url,
            title: d.title,
            description: d.description,
            content: d.content,
            notes: d.notes,
            tags: d.tags,
            hidden: d.hidden,
            added_at: d.added_at,
            updated_at: d.updated_at,
            crawled_at: d.crawled_at,
            http_status: d.http_status,
            crawl_error: d.crawl_error,
            has_embedding: d.embedding.is_some(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddLinkRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct LinksListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub show_hidden: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct LinksListResponse {
    pub links: Vec<LinkSummary>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub kw_weight: Option<f64>,
    pub vw_weight: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct CrawlRequest {
    pub url: Option<String>,
    pub missing: Option<bool>,
    pub all: Option<bool>,
    pub old_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CrawlResult {
    pub url: String,
    pub success: bool,
    pub http_status: Option<i64>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DatabaseStatus {
    pub document_count: usize,
    pub embedded_count: usize,
    pub pending_embedding_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
