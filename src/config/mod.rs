use std::time::Duration;

use crate::errors::{SahamError, SahamResult};

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub alias_path: String,
    pub data_dir: String,
    pub max_age_hours: i64,
    pub fetch_retries: u32,
    pub retry_delay: Duration,
    pub http_timeout: Duration,
    /// Selects the text-density extraction strategy. Resolved once here;
    /// the extractor never probes at call time.
    pub reader_mode: bool,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> SahamResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        // Default db_path is relative to executable directory
        let db_path = std::env::var("SAHAM_DB_PATH").unwrap_or_else(|_| {
            exe_dir
                .map(|d| d.join("saham.db").to_string_lossy().into_owned())
                .unwrap_or_else(|| "./saham.db".to_string())
        });

        let alias_path = std::env::var("SAHAM_ALIAS_PATH")
            .unwrap_or_else(|_| "data/kode_saham/kode_saham.csv".to_string());

        let data_dir =
            std::env::var("SAHAM_DATA_DIR").unwrap_or_else(|_| "data/ksei".to_string());

        let max_age_hours = parse_var("SAHAM_MAX_AGE_HOURS", 12)?;
        let fetch_retries = parse_var("SAHAM_FETCH_RETRIES", 1)?;
        let retry_delay = Duration::from_millis(parse_var("SAHAM_RETRY_DELAY_MS", 600)?);
        let http_timeout = Duration::from_secs(parse_var("SAHAM_HTTP_TIMEOUT_SECS", 12)?);
        let reader_mode = parse_flag("SAHAM_READER_MODE", true);

        Ok(Self {
            db_path,
            alias_path,
            data_dir,
            max_age_hours,
            fetch_retries,
            retry_delay,
            http_timeout,
            reader_mode,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> SahamResult<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| SahamError::Config(format!("{} is not a valid number: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

fn parse_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(raw) => matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}
