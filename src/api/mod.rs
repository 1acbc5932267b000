use std::time::Duration;
use thiserror::Error;

use crate::models::CompanySnapshot;

pub mod yahoo;
pub use yahoo::YahooClient;

/// Errors raised at the fetch boundary. Each one is caught per ticker by
/// the record builder and surfaced as record-level error text.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API request failed with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("no data returned for symbol {0}")]
    UnknownSymbol(String),

    /// Error reported inside an otherwise well-formed provider response
    #[error("{0}")]
    Provider(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Simple pacer that spaces out provider requests
pub struct RequestPacer {
    delay_ms: u64,
}

impl RequestPacer {
    pub fn new(requests_per_minute: u32) -> Self {
        let delay_ms = if requests_per_minute > 0 {
            60_000 / requests_per_minute as u64
        } else {
            1000 // Default 1 second delay
        };

        Self { delay_ms }
    }

    pub async fn wait(&self) {
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
    }
}

/// Common trait for market-data providers
#[async_trait::async_trait]
pub trait FinancialDataProvider: Send + Sync {
    /// Fetch company metadata and annual statement history for one symbol
    async fn fetch_company(&self, symbol: &str) -> Result<CompanySnapshot, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_pacer() {
        let pacer = RequestPacer::new(600); // 600 requests per minute

        let start = std::time::Instant::now();

        pacer.wait().await;
        // With 600 req/min, each request should wait ~100ms
        assert!(start.elapsed() >= Duration::from_millis(90));
    }

    #[test]
    fn test_pacer_zero_rate_falls_back_to_one_second() {
        let pacer = RequestPacer::new(0);
        assert_eq!(pacer.delay_ms, 1000);
    }
}
