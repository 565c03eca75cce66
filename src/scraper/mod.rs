// Retailer collection layer: a fetch seam plus per-retailer extraction and
// scrape loops. All HTML parsing happens in synchronous helpers over fetched
// string bodies.
pub mod amazon;
pub mod bhphoto;
pub mod fetcher;
pub mod microcenter;
pub mod newegg;
pub mod ram;

use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::warn;

use crate::model::ScrapeError;

pub use fetcher::HttpFetcher;

// Source names used in the status map; identity reconciliation keys on these.
pub const SRC_NEWEGG: &str = "newegg";
pub const SRC_NEWEGG_RAM: &str = "newegg-ram";
pub const SRC_AMAZON: &str = "amazon";
pub const SRC_AMAZON_RAM: &str = "amazon-ram";
pub const SRC_MICROCENTER: &str = "microcenter";
pub const SRC_MICROCENTER_RAM: &str = "microcenter-ram";
pub const SRC_BHPHOTO: &str = "bhphoto";
pub const SRC_BHPHOTO_RAM: &str = "bhphoto-ram";

/// Async page fetch seam. Production uses `HttpFetcher`; tests drive the
/// scrape loops with canned bodies.
#[async_trait::async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

/// Run a whole-source scrape with a bounded retry loop and exponential
/// backoff between attempts. The final error is returned to the caller,
/// which records it as the source status; it never aborts the run.
pub async fn with_retries<T, F, Fut>(
    source: &str,
    max_attempts: u32,
    backoff: f64,
    mut op: F,
) -> Result<T, ScrapeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScrapeError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt + 1 < max_attempts => {
                let wait = backoff.powi(attempt as i32);
                warn!(source, attempt = attempt + 1, "scrape failed: {e}; retrying in {wait:.0}s");
                sleep(Duration::from_secs_f64(wait)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retries("test", 3, 0.0, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ScrapeError::InvalidResponse { url: "u".into(), status: 503 })
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retries("test", 2, 0.0, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ScrapeError::InvalidResponse { url: "u".into(), status: 500 }) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
