// HTTP page fetcher with jittered pacing between requests.
use rand::Rng;
use reqwest::Client;
use tokio::time::{sleep, Duration};
use tracing::debug;

use crate::config::AppConfig;
use crate::model::ScrapeError;
use crate::scraper::Fetch;

pub struct HttpFetcher {
    client: Client,
    min_delay_secs: f64,
    max_delay_secs: f64,
}

impl HttpFetcher {
    pub fn new(cfg: &AppConfig) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(&cfg.user_agent)
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            min_delay_secs: cfg.min_delay_secs,
            max_delay_secs: cfg.max_delay_secs,
        })
    }

    /// Randomized pause before every request keeps the traffic pattern
    /// irregular.
    async fn pause(&self) {
        let secs = rand::rng().random_range(self.min_delay_secs..=self.max_delay_secs);
        sleep(Duration::from_secs_f64(secs)).await;
    }
}

#[async_trait::async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        self.pause().await;
        debug!(url, "fetching");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::InvalidResponse {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response.text().await?)
    }
}
