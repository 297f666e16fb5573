use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One news item flowing through the pipeline. Identity for in-memory
/// de-duplication is the (title, link) pair; the persistent key inside a
/// stock code's cache partition is `link_hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub content: Option<String>,
    pub source: String,
    pub published: Option<DateTime<Utc>>,
    pub cached_at: Option<DateTime<Utc>>,
}

impl Article {
    pub fn new(title: String, link: String) -> Self {
        Self {
            title,
            link,
            summary: String::new(),
            content: None,
            source: String::new(),
            published: None,
            cached_at: None,
        }
    }

    /// SHA-256 of the link, hex encoded. Stable across runs, so re-fetched
    /// articles land on their existing cache row.
    pub fn link_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.link.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Sort key for newest-first ordering: publication date when the feed
    /// provided one, cache time otherwise, then the caller's fallback.
    pub fn recency(&self, fallback: DateTime<Utc>) -> DateTime<Utc> {
        self.published.or(self.cached_at).unwrap_or(fallback)
    }

    pub fn with_summary(mut self, summary: String) -> Self {
        self.summary = summary;
        self
    }

    pub fn with_content(mut self, content: Option<String>) -> Self {
        self.content = content;
        self
    }

    pub fn with_source(mut self, source: String) -> Self {
        self.source = source;
        self
    }

    pub fn with_published(mut self, published: Option<DateTime<Utc>>) -> Self {
        self.published = published;
        self
    }

    pub fn with_cached_at(mut self, cached_at: Option<DateTime<Utc>>) -> Self {
        self.cached_at = cached_at;
        self
    }
}
