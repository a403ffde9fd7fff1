//! Oracle fetch seam.
//!
//! `HttpOracleFeed` performs a bounded `GET` against the market's oracle URL.
//! `StaticOracleFeed` serves prices from memory for tests and dry runs.

use crate::error::{FeedError, FeedResult};
use crate::normalize::{normalize, FeedProvider, NormalizedPrice};
use dashmap::DashMap;
use reqwest::Client;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, warn};

/// Boxed future for async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// Default timeout for oracle requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of spot prices.
///
/// Implementations never substitute a cached or placeholder value when a
/// fetch fails; the error is returned to the caller.
pub trait OracleFeed: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, FeedResult<NormalizedPrice>>;
}

/// HTTP oracle client.
pub struct HttpOracleFeed {
    client: Client,
    provider: FeedProvider,
}

impl HttpOracleFeed {
    pub fn new(provider: FeedProvider) -> FeedResult<Self> {
        Self::with_timeout(provider, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(provider: FeedProvider, timeout: Duration) -> FeedResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Fetch(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, provider })
    }

    async fn fetch_inner(&self, url: &str) -> FeedResult<NormalizedPrice> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FeedError::Fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url, %status, "Oracle returned error status");
            return Err(FeedError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FeedError::Malformed(format!("{url}: {e}")))?;

        let price = normalize(&payload, self.provider)?;
        debug!(url, price = %price.price, symbol = ?price.symbol, "Oracle price fetched");
        Ok(price)
    }
}

impl OracleFeed for HttpOracleFeed {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, FeedResult<NormalizedPrice>> {
        Box::pin(self.fetch_inner(url))
    }
}

/// In-memory feed keyed by oracle URL.
#[derive(Debug, Default)]
pub struct StaticOracleFeed {
    prices: DashMap<String, NormalizedPrice>,
}

impl StaticOracleFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(self, url: impl Into<String>, price: impl Into<String>) -> Self {
        self.set_price(url, price);
        self
    }

    pub fn set_price(&self, url: impl Into<String>, price: impl Into<String>) {
        self.prices.insert(url.into(), NormalizedPrice::new(price));
    }

    pub fn remove(&self, url: &str) {
        self.prices.remove(url);
    }
}

impl OracleFeed for StaticOracleFeed {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, FeedResult<NormalizedPrice>> {
        Box::pin(async move {
            self.prices
                .get(url)
                .map(|entry| entry.value().clone())
                .ok_or_else(|| FeedError::UnknownUrl(url.to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_http_feed_normalizes_coincap() {
        let router = Router::new().route(
            "/v2/rates/bitcoin",
            get(|| async {
                Json(json!({
                    "data": {"symbol": "BTC", "rateUsd": "6500.25"},
                    "timestamp": 1_535_000_000_000i64
                }))
            }),
        );
        let base = serve(router).await;

        let feed = HttpOracleFeed::new(FeedProvider::Auto).unwrap();
        let price = feed
            .fetch(&format!("{base}/v2/rates/bitcoin"))
            .await
            .unwrap();
        assert_eq!(price.price, "6500.25");
        assert_eq!(price.symbol.as_deref(), Some("BTC"));
    }

    #[tokio::test]
    async fn test_http_feed_error_status() {
        let router = Router::new().route(
            "/down",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        );
        let base = serve(router).await;

        let feed = HttpOracleFeed::new(FeedProvider::Coincap).unwrap();
        let result = feed.fetch(&format!("{base}/down")).await;
        assert!(matches!(result, Err(FeedError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_http_feed_timeout() {
        let router = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"data": {"priceUsd": "1"}}))
            }),
        );
        let base = serve(router).await;

        let feed =
            HttpOracleFeed::with_timeout(FeedProvider::Coincap, Duration::from_millis(100))
                .unwrap();
        let result = feed.fetch(&format!("{base}/slow")).await;
        assert!(matches!(result, Err(FeedError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_static_feed() {
        let feed = StaticOracleFeed::new().with_price("oracle://btc", "0.40");
        assert_eq!(feed.fetch("oracle://btc").await.unwrap().price, "0.40");

        feed.remove("oracle://btc");
        assert!(matches!(
            feed.fetch("oracle://btc").await,
            Err(FeedError::UnknownUrl(_))
        ));
    }
}
