use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::domain::{Article, KeywordSet};
use crate::errors::SahamResult;
use crate::extract::ContentExtractor;
use crate::sources::{FeedFetcher, NewsSource, SourceOutcome, SourceReport};
use crate::storage::traits::ArticleCacheRepository;

pub const DEFAULT_MAX_AGE_HOURS: i64 = 12;

#[derive(Debug, Clone)]
pub struct NewsOptions {
    /// Skip the freshness check and re-fetch unconditionally.
    pub refresh: bool,
    pub max_age_hours: i64,
    /// Display cap. The full matched set is always cached.
    pub limit: Option<usize>,
}

impl Default for NewsOptions {
    fn default() -> Self {
        Self {
            refresh: false,
            max_age_hours: DEFAULT_MAX_AGE_HOURS,
            limit: None,
        }
    }
}

#[derive(Debug)]
pub struct NewsReport {
    pub articles: Vec<Article>,
    pub keyword_string: String,
    pub from_cache: bool,
    /// Set when a refresh found nothing and the stale cache was served.
    pub stale: bool,
    pub fallback_used: bool,
    pub sources: Vec<SourceReport>,
}

/// Cache-first news pipeline for one stock code: load, re-fetch when stale
/// or empty, filter by keyword, de-duplicate, sort, persist.
pub struct NewsService<C: ArticleCacheRepository> {
    cache: C,
    fetcher: FeedFetcher,
}

impl<C: ArticleCacheRepository> NewsService<C> {
    pub fn new(cache: C, fetcher: FeedFetcher) -> Self {
        Self { cache, fetcher }
    }

    pub fn news(
        &self,
        code: &str,
        keywords: &KeywordSet,
        sources: &[Box<dyn NewsSource>],
        fallback: Option<&dyn NewsSource>,
        options: &NewsOptions,
    ) -> SahamResult<NewsReport> {
        let keyword_string = keywords.joined();

        if !options.refresh {
            let (is_fresh, cached) = self.cache.load(code, options.max_age_hours)?;
            if is_fresh && !cached.is_empty() {
                return Ok(NewsReport {
                    articles: clip(cached, options.limit),
                    keyword_string,
                    from_cache: true,
                    stale: false,
                    fallback_used: false,
                    sources: Vec::new(),
                });
            }
        }

        let (raw, mut reports) = self.fetcher.fetch_all(sources);

        let mut matched: Vec<Article> = raw
            .into_iter()
            .filter(|article| keywords.matches(&format!("{} {}", article.title, article.summary)))
            .collect();

        // The search fallback filters server-side; its hits are taken as-is.
        let mut fallback_used = false;
        if matched.is_empty() {
            if let Some(fallback) = fallback {
                fallback_used = true;
                match self.fetcher.fetch_source(fallback) {
                    Ok(found) => {
                        reports.push(SourceReport {
                            label: fallback.label().to_string(),
                            outcome: SourceOutcome::Fetched(found.len()),
                        });
                        matched = found;
                    }
                    Err(e) => {
                        reports.push(SourceReport {
                            label: fallback.label().to_string(),
                            outcome: SourceOutcome::Skipped(e),
                        });
                    }
                }
            }
        }

        let mut articles = dedup_articles(matched);
        sort_newest_first(&mut articles, Utc::now());

        self.cache.save(code, &keyword_string, &articles)?;

        if articles.is_empty() {
            // Nothing fetched; serve whatever the cache still holds.
            let (_, cached) = self.cache.load(code, options.max_age_hours)?;
            if !cached.is_empty() {
                return Ok(NewsReport {
                    articles: clip(cached, options.limit),
                    keyword_string,
                    from_cache: true,
                    stale: true,
                    fallback_used,
                    sources: reports,
                });
            }
        }

        Ok(NewsReport {
            articles: clip(articles, options.limit),
            keyword_string,
            from_cache: false,
            stale: false,
            fallback_used,
            sources: reports,
        })
    }

    /// Fill in missing article bodies via the extractor and re-save, so the
    /// content lands on the existing cache rows. Returns how many articles
    /// gained content; extraction misses leave the summary in charge.
    pub fn attach_content(
        &self,
        code: &str,
        keyword_string: &str,
        articles: &mut [Article],
        extractor: &ContentExtractor,
    ) -> SahamResult<usize> {
        let mut extracted = 0;

        for article in articles.iter_mut() {
            let has_content = article
                .content
                .as_deref()
                .map(|c| !c.is_empty())
                .unwrap_or(false);
            if has_content {
                continue;
            }
            if let Some(text) = extractor.extract(&article.link) {
                article.content = Some(text);
                extracted += 1;
            }
        }

        if extracted > 0 {
            self.cache.save(code, keyword_string, articles)?;
        }

        Ok(extracted)
    }
}

/// First occurrence wins; order is preserved for the later sort.
fn dedup_articles(articles: Vec<Article>) -> Vec<Article> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut unique = Vec::with_capacity(articles.len());

    for article in articles {
        let key = (article.title.clone(), article.link.clone());
        if seen.insert(key) {
            unique.push(article);
        }
    }

    unique
}

/// Stable newest-first sort. Entries without any date sort at the fetch
/// moment, matching how the cache orders COALESCE(pub_date, cached_at).
fn sort_newest_first(articles: &mut [Article], fetched_at: DateTime<Utc>) {
    articles.sort_by_key(|article| std::cmp::Reverse(article.recency(fetched_at)));
}

fn clip(mut articles: Vec<Article>, limit: Option<usize>) -> Vec<Article> {
    if let Some(limit) = limit {
        articles.truncate(limit);
    }
    articles
}
