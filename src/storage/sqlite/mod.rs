mod article_cache_repository;
mod connection;

pub use article_cache_repository::SqliteArticleCacheRepository;
pub use connection::SqliteStorage;
