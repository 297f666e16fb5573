use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::params;

use crate::domain::Article;
use crate::errors::SahamResult;
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::ArticleCacheRepository;

/// Conflict key is (code, link_hash). Mutable fields update with latest
/// non-null wins, so a re-fetch without extracted content never wipes
/// content captured earlier; the cache stamp and keyword string always move.
const UPSERT_SQL: &str = r#"
INSERT INTO articles (code, title, link, link_hash, summary, content, source, pub_date, cached_at, keywords)
VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
ON CONFLICT (code, link_hash) DO UPDATE SET
    title = COALESCE(excluded.title, articles.title),
    summary = COALESCE(excluded.summary, articles.summary),
    content = COALESCE(excluded.content, articles.content),
    source = COALESCE(excluded.source, articles.source),
    pub_date = COALESCE(excluded.pub_date, articles.pub_date),
    cached_at = excluded.cached_at,
    keywords = excluded.keywords
"#;

const SELECT_COLUMNS: &str = "title, link, summary, content, source, pub_date, cached_at";

pub struct SqliteArticleCacheRepository {
    storage: SqliteStorage,
}

impl SqliteArticleCacheRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

impl ArticleCacheRepository for SqliteArticleCacheRepository {
    fn save(&self, code: &str, keywords: &str, articles: &[Article]) -> SahamResult<usize> {
        if articles.is_empty() {
            return Ok(0);
        }

        let now = to_db_time(Utc::now());
        let mut conn = self.storage.connection()?;
        let tx = conn.transaction()?;

        let mut saved = 0;
        for article in articles {
            saved += tx.execute(
                UPSERT_SQL,
                params![
                    code,
                    article.title,
                    article.link,
                    article.link_hash(),
                    non_empty(&article.summary),
                    article.content.as_deref().and_then(non_empty),
                    non_empty(&article.source),
                    article.published.map(to_db_time),
                    now,
                    keywords,
                ],
            )?;
        }

        tx.commit()?;
        Ok(saved)
    }

    fn load(&self, code: &str, max_age_hours: i64) -> SahamResult<(bool, Vec<Article>)> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM articles WHERE code = ?1 \
             ORDER BY COALESCE(pub_date, cached_at) DESC",
            SELECT_COLUMNS
        ))?;

        let articles: Vec<Article> = stmt
            .query_map([code], row_to_article)?
            .collect::<Result<_, _>>()?;

        if articles.is_empty() {
            return Ok((false, articles));
        }

        let is_fresh = match articles.iter().filter_map(|a| a.cached_at).max() {
            Some(latest) => {
                // Hour counts beyond the representable range clamp by sign.
                let window = match Duration::try_hours(max_age_hours) {
                    Some(window) => window,
                    None if max_age_hours < 0 => Duration::MIN,
                    None => Duration::MAX,
                };
                Utc::now().signed_duration_since(latest) <= window
            }
            None => false,
        };

        Ok((is_fresh, articles))
    }

    fn recent(&self, code: &str, limit: usize) -> SahamResult<Vec<Article>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM articles WHERE code = ?1 \
             ORDER BY COALESCE(pub_date, cached_at) DESC LIMIT ?2",
            SELECT_COLUMNS
        ))?;

        let articles = stmt
            .query_map(params![code, limit as i64], row_to_article)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(articles)
    }
}

/// Second-precision RFC 3339 in UTC. Fixed width, so the string ordering
/// SQLite applies inside COALESCE(pub_date, cached_at) matches time order.
fn to_db_time(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn from_db_time(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn row_to_article(row: &rusqlite::Row<'_>) -> rusqlite::Result<Article> {
    let title: String = row.get(0)?;
    let link: String = row.get(1)?;
    let summary: Option<String> = row.get(2)?;
    let content: Option<String> = row.get(3)?;
    let source: Option<String> = row.get(4)?;
    let pub_date: Option<String> = row.get(5)?;
    let cached_at: Option<String> = row.get(6)?;

    Ok(Article::new(title, link)
        .with_summary(summary.unwrap_or_default())
        .with_content(content)
        .with_source(source.unwrap_or_default())
        .with_published(pub_date.as_deref().and_then(from_db_time))
        .with_cached_at(cached_at.as_deref().and_then(from_db_time)))
}
