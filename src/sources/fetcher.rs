use std::thread;
use std::time::Duration;

use crate::domain::Article;
use crate::sources::traits::{FetchError, NewsSource};

/// Outcome of one source after retries are spent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Fetched(usize),
    Skipped(FetchError),
}

#[derive(Debug, Clone)]
pub struct SourceReport {
    pub label: String,
    pub outcome: SourceOutcome,
}

/// Walks sources strictly in order, single-threaded. Each source gets
/// `retries + 1` attempts with a pause in between; the first attempt that
/// parses to a non-empty entry list wins. A source that never succeeds is
/// reported and skipped, never fatal.
pub struct FeedFetcher {
    retries: u32,
    delay: Duration,
}

impl FeedFetcher {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    pub fn fetch_all(&self, sources: &[Box<dyn NewsSource>]) -> (Vec<Article>, Vec<SourceReport>) {
        let mut articles = Vec::new();
        let mut reports = Vec::with_capacity(sources.len());

        for source in sources {
            match self.fetch_source(source.as_ref()) {
                Ok(mut fetched) => {
                    reports.push(SourceReport {
                        label: source.label().to_string(),
                        outcome: SourceOutcome::Fetched(fetched.len()),
                    });
                    articles.append(&mut fetched);
                }
                Err(e) => {
                    reports.push(SourceReport {
                        label: source.label().to_string(),
                        outcome: SourceOutcome::Skipped(e),
                    });
                }
            }
        }

        (articles, reports)
    }

    /// Retry loop for one source. The last error wins the report when every
    /// attempt fails.
    pub fn fetch_source(&self, source: &dyn NewsSource) -> Result<Vec<Article>, FetchError> {
        let mut last = FetchError::NoEntries;

        for attempt in 0..=self.retries {
            match source.fetch() {
                Ok(articles) => return Ok(articles),
                Err(e) => last = e,
            }
            if attempt < self.retries {
                thread::sleep(self.delay);
            }
        }

        Err(last)
    }
}
