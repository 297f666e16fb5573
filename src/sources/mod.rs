pub mod catalog;
pub mod fetcher;
pub mod google_news;
pub mod rss;
pub mod traits;

pub use fetcher::{FeedFetcher, SourceOutcome, SourceReport};
pub use google_news::GoogleNewsSource;
pub use rss::RssSource;
pub use traits::{FetchError, NewsSource};
