use crate::domain::Article;
use crate::errors::SahamResult;

#[cfg_attr(test, mockall::automock)]
pub trait ArticleCacheRepository: Send + Sync {
    /// Upsert articles under `code`, stamping a fresh cache time on every
    /// row. Returns the number of rows written.
    fn save(&self, code: &str, keywords: &str, articles: &[Article]) -> SahamResult<usize>;

    /// All records for `code`, newest first, plus a freshness flag computed
    /// from the most recent cache time versus the age threshold.
    fn load(&self, code: &str, max_age_hours: i64) -> SahamResult<(bool, Vec<Article>)>;

    /// Bounded newest-first view for offline display.
    fn recent(&self, code: &str, limit: usize) -> SahamResult<Vec<Article>>;
}
