//! CoinGecko market data client.
//!
//! Fetches the top coins by market cap in USD and reshapes them into
//! [`CoinSummary`] records. Stateless; every call hits the upstream API.

mod models;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

pub use models::CoinSummary;
use models::MarketRow;

pub const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Number of coins requested per call.
pub const TOP_COINS: usize = 10;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("Market data request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Market data provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Could not decode market data: {0}")]
    Decode(String),
}

/// Source of simplified coin prices.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Top coins by market cap, priced in USD, at most [`TOP_COINS`] entries.
    async fn top_coins(&self) -> Result<Vec<CoinSummary>, MarketDataError>;
}

#[derive(Clone)]
pub struct CoinGeckoClient {
    base_url: String,
    client: Client,
}

impl CoinGeckoClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, MarketDataError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("coinwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl MarketDataProvider for CoinGeckoClient {
    async fn top_coins(&self) -> Result<Vec<CoinSummary>, MarketDataError> {
        let url = format!("{}/coins/markets", self.base_url);
        let per_page = TOP_COINS.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("vs_currency", "usd"), ("per_page", per_page.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("CoinGecko returned HTTP {}", status);
            return Err(MarketDataError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        let rows: Vec<MarketRow> =
            serde_json::from_slice(&bytes).map_err(|e| MarketDataError::Decode(e.to_string()))?;

        tracing::debug!("Fetched {} coins from CoinGecko", rows.len());

        Ok(rows
            .into_iter()
            .take(TOP_COINS)
            .map(CoinSummary::from)
            .collect())
    }
}
