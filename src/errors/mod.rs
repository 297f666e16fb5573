use thiserror::Error;

#[derive(Error, Debug)]
pub enum SahamError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Parsing errors
    #[error("Feed parsing failed: {0}")]
    FeedParse(String),

    #[error("CSV error in {path}: {message}")]
    CsvFile { path: String, message: String },

    #[error("OPML serialization failed: {0}")]
    Opml(String),

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    // User input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No ownership data for {0}")]
    NoOwnershipData(String),
}

pub type SahamResult<T> = Result<T, SahamError>;
