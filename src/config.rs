use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
pub const DEFAULT_RESET_DELAY_MS: u64 = 3000;

/// Configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub download_dir: PathBuf,
    pub reset_delay: Duration,
    /// `None` waits on the service forever
    pub request_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: DEFAULT_BASE_URL.to_string(),
            download_dir: PathBuf::from(DEFAULT_DOWNLOAD_DIR),
            reset_delay: Duration::from_millis(DEFAULT_RESET_DELAY_MS),
            request_timeout: None,
        }
    }
}

impl Config {
    /// Build a config from a variable lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(base_url) = lookup("CONVERTER_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = base_url.trim().trim_end_matches('/').to_string();
        }
        if let Some(dir) = lookup("DOWNLOAD_DIR").filter(|v| !v.trim().is_empty()) {
            config.download_dir = PathBuf::from(dir);
        }
        if let Some(delay) = lookup("RESET_DELAY_MS") {
            let millis: u64 = delay
                .trim()
                .parse()
                .with_context(|| format!("RESET_DELAY_MS must be a whole number, got '{delay}'"))?;
            config.reset_delay = Duration::from_millis(millis);
        }
        if let Some(timeout) = lookup("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = timeout.trim().parse().with_context(|| {
                format!("REQUEST_TIMEOUT_SECS must be a whole number, got '{timeout}'")
            })?;
            config.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }
}

/// Load configuration from `.env` and environment
pub fn load_config() -> Result<Config> {
    // Load `.env` file if present
    dotenv::dotenv().ok();
    Config::from_lookup(|key| std::env::var(key).ok())
}
