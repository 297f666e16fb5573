pub mod news_service;

pub use news_service::{NewsOptions, NewsReport, NewsService, DEFAULT_MAX_AGE_HOURS};
