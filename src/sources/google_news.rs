use std::time::Duration;

use feed_rs::parser;
use reqwest::blocking::Client;
use url::form_urlencoded;

use crate::domain::Article;
use crate::extract::BROWSER_UA;
use crate::sources::traits::{FetchError, NewsSource};

const GOOGLE_NEWS_RSS: &str = "https://news.google.com/rss/search";
const GOOGLE_NEWS_LABEL: &str = "Google News";

/// Entries taken per query. The search feed is ranked by relevance, so a
/// short head is enough for a fallback.
const RESULT_LIMIT: usize = 10;

/// Keyword-search fallback used when the catalog feeds yield nothing.
pub struct GoogleNewsSource {
    query: String,
    client: Client,
}

impl GoogleNewsSource {
    pub fn new(query: impl Into<String>, timeout: Duration) -> Self {
        Self {
            query: query.into(),
            client: Client::builder()
                .timeout(timeout)
                .user_agent(BROWSER_UA)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn search_url(&self) -> String {
        let encoded: String = form_urlencoded::byte_serialize(self.query.as_bytes()).collect();
        format!("{}?q={}", GOOGLE_NEWS_RSS, encoded)
    }
}

impl NewsSource for GoogleNewsSource {
    fn label(&self) -> &str {
        GOOGLE_NEWS_LABEL
    }

    fn fetch(&self) -> Result<Vec<Article>, FetchError> {
        let response = self
            .client
            .get(self.search_url())
            .send()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Http(format!("status {}", response.status())));
        }

        let bytes = response.bytes().map_err(|e| FetchError::Http(e.to_string()))?;
        map_articles(&bytes, RESULT_LIMIT)
    }
}

/// Search results already match the query server-side, so no local keyword
/// filter runs on these. Summaries are left empty: the search feed's
/// description is a block of cross-links, not article text.
fn map_articles(bytes: &[u8], limit: usize) -> Result<Vec<Article>, FetchError> {
    let feed = parser::parse(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

    let articles: Vec<Article> = feed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry.links.into_iter().next().map(|l| l.href)?;
            let raw_title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .unwrap_or_default();
            let (title, publisher) = split_publisher(&raw_title);
            let published = entry.published.or(entry.updated);

            Some(
                Article::new(title, link)
                    .with_source(publisher.unwrap_or_else(|| GOOGLE_NEWS_LABEL.to_string()))
                    .with_published(published),
            )
        })
        .take(limit)
        .collect();

    if articles.is_empty() {
        return Err(FetchError::NoEntries);
    }

    Ok(articles)
}

/// Google News titles read "Headline - Publisher"; peel the publisher off
/// the end so the article carries its real source.
fn split_publisher(title: &str) -> (String, Option<String>) {
    if let Some(pos) = title.rfind(" - ") {
        let head = title[..pos].trim();
        let tail = title[pos + 3..].trim();
        if !head.is_empty() && !tail.is_empty() {
            return (head.to_string(), Some(tail.to_string()));
        }
    }
    (title.to_string(), None)
}
