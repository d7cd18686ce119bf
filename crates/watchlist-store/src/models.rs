//! Watchlist Data Models

use serde::{Deserialize, Serialize};

/// A single watched asset belonging to one identity.
///
/// On disk and on the wire the owner is stored as `user` and the asset
/// identifier as `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    /// Identity that created the entry
    #[serde(rename = "user")]
    pub owner: String,
    /// Market-data identifier, e.g. `bitcoin`
    #[serde(rename = "id")]
    pub asset_id: String,
    /// Ticker label shown to the user, e.g. `BTC`
    pub symbol: String,
}

impl WatchlistEntry {
    pub fn new(owner: impl Into<String>, asset_id: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            asset_id: asset_id.into(),
            symbol: symbol.into(),
        }
    }

    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.owner == owner
    }

    /// True when this entry belongs to `owner` and tracks `asset_id`.
    pub fn matches(&self, owner: &str, asset_id: &str) -> bool {
        self.owner == owner && self.asset_id == asset_id
    }

    /// Owner and asset id must both be non-empty.
    pub fn is_valid(&self) -> bool {
        !self.owner.is_empty() && !self.asset_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_wire_field_names() {
        let entry = WatchlistEntry::new("alice", "bitcoin", "BTC");
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(
            value,
            serde_json::json!({ "user": "alice", "id": "bitcoin", "symbol": "BTC" })
        );
    }

    #[test]
    fn test_matches_requires_owner_and_asset() {
        let entry = WatchlistEntry::new("alice", "bitcoin", "BTC");

        assert!(entry.matches("alice", "bitcoin"));
        assert!(!entry.matches("bob", "bitcoin"));
        assert!(!entry.matches("alice", "ethereum"));
    }

    #[test]
    fn test_is_valid() {
        assert!(WatchlistEntry::new("alice", "bitcoin", "").is_valid());
        assert!(!WatchlistEntry::new("", "bitcoin", "BTC").is_valid());
        assert!(!WatchlistEntry::new("alice", "", "BTC").is_valid());
    }
}
