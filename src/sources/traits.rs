use thiserror::Error;

use crate::domain::Article;

/// Why a source yielded nothing. Sources are skipped rather than failing the
/// pipeline; the variant keeps the reason visible to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("feed parsing failed: {0}")]
    Parse(String),

    #[error("feed has no entries")]
    NoEntries,
}

pub trait NewsSource: Send + Sync {
    /// Label shown in reports and used when the feed carries no title.
    fn label(&self) -> &str;

    /// Fetch the entries the source currently offers. A feed that parses but
    /// carries no entries is `FetchError::NoEntries`, so `Ok` is never empty.
    fn fetch(&self) -> Result<Vec<Article>, FetchError>;
}
