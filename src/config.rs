use serde::Deserialize;
use std::fs;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    // Budget window for combo deals
    pub min_budget: f64,
    pub max_budget: f64,

    // RAM requirements
    pub min_ram_gb: u32,

    // Scraper pacing
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
    pub max_retries: u32,
    pub retry_backoff: f64, // exponential backoff multiplier
    pub request_timeout_secs: u64,

    // Persistent state
    pub db_path: String,
    pub price_cache_ttl_secs: i64,

    // Notifications
    pub discord_webhook_url: String,

    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            min_budget: 500.0,
            max_budget: 1300.0,
            min_ram_gb: 32,
            min_delay_secs: 2.0,
            max_delay_secs: 5.0,
            max_retries: 3,
            retry_backoff: 2.0,
            request_timeout_secs: 30,
            db_path: "deals.db".into(),
            price_cache_ttl_secs: 8 * 3600,
            discord_webhook_url: String::new(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/131.0.0.0 Safari/537.36"
                .into(),
        }
    }
}

/// Load configuration from a JSON file; a missing file yields the defaults.
pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(e.into()),
    }
}
