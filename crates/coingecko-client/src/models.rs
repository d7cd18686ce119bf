use serde::{Deserialize, Serialize};

/// Simplified price record returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinSummary {
    pub id: String,
    pub symbol: String,
    /// Current price in USD; CoinGecko reports `null` for some illiquid coins
    pub price: Option<f64>,
    pub image: String,
}

/// One row of `/coins/markets`. Only the fields we reshape are decoded.
#[derive(Debug, Deserialize)]
pub(crate) struct MarketRow {
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub image: Option<String>,
}

impl From<MarketRow> for CoinSummary {
    fn from(row: MarketRow) -> Self {
        CoinSummary {
            id: row.id,
            symbol: row.symbol,
            price: row.current_price,
            image: row.image.unwrap_or_default(),
        }
    }
}
