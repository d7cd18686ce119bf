//! Watchlist Store
//!
//! Identity-scoped watchlist entries kept in memory and mirrored to a JSON
//! snapshot file that is rewritten wholesale on every mutation.

pub mod error;
pub mod models;
mod persistence;
pub mod store;

pub use error::StoreError;
pub use models::WatchlistEntry;
pub use store::WatchlistStore;
