use std::path::{Path, PathBuf};

use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::WatchlistEntry;
use crate::persistence::{load_snapshot, write_snapshot};

/// Owns the watchlist collection and its on-disk snapshot.
///
/// Every operation is scoped to the caller's identity: entries belonging to
/// another owner are never returned or modified. Mutations are applied to a
/// copy of the collection, written to disk, and only then swapped in, so a
/// failed write leaves both memory and disk untouched. The write lock is held
/// across the snapshot write, which serializes concurrent mutations.
pub struct WatchlistStore {
    path: PathBuf,
    entries: RwLock<Vec<WatchlistEntry>>,
}

impl WatchlistStore {
    /// Load the collection from `path`. Never fails: a missing or malformed
    /// file yields an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_snapshot(&path).await;

        tracing::info!(
            "Watchlist store loaded {} entries from {}",
            entries.len(),
            path.display()
        );

        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total entries across all owners.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// All entries owned by `owner`, in insertion order.
    pub async fn list_by_owner(&self, owner: &str) -> Vec<WatchlistEntry> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|e| e.is_owned_by(owner))
            .cloned()
            .collect()
    }

    /// First entry owned by `owner` tracking `asset_id`.
    pub async fn get(&self, owner: &str, asset_id: &str) -> Result<WatchlistEntry, StoreError> {
        self.entries
            .read()
            .await
            .iter()
            .find(|e| e.matches(owner, asset_id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    /// Append a new entry and persist. Duplicate `(owner, asset_id)` pairs
    /// are accepted.
    pub async fn add(
        &self,
        owner: &str,
        asset_id: &str,
        symbol: &str,
    ) -> Result<WatchlistEntry, StoreError> {
        if owner.is_empty() {
            return Err(StoreError::InvalidInput("user requerido".to_string()));
        }
        if asset_id.is_empty() || symbol.is_empty() {
            return Err(StoreError::InvalidInput("id y symbol requeridos".to_string()));
        }

        let entry = WatchlistEntry::new(owner, asset_id, symbol);

        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        next.push(entry.clone());
        self.commit(&mut entries, next).await?;

        tracing::debug!("Watchlist add: {} -> {} ({})", owner, asset_id, symbol);
        Ok(entry)
    }

    /// Change the symbol of the first matching entry and persist.
    pub async fn update_symbol(
        &self,
        owner: &str,
        asset_id: &str,
        symbol: &str,
    ) -> Result<WatchlistEntry, StoreError> {
        if symbol.is_empty() {
            return Err(StoreError::InvalidInput("symbol requerido".to_string()));
        }

        let mut entries = self.entries.write().await;
        let index = entries
            .iter()
            .position(|e| e.matches(owner, asset_id))
            .ok_or(StoreError::NotFound)?;

        let mut next = entries.clone();
        next[index].symbol = symbol.to_string();
        let updated = next[index].clone();
        self.commit(&mut entries, next).await?;

        tracing::debug!("Watchlist update: {} -> {} now {}", owner, asset_id, symbol);
        Ok(updated)
    }

    /// Remove every entry owned by `owner` tracking `asset_id`.
    ///
    /// Returns the removed asset id, or `None` when nothing matched. A miss
    /// does not touch the snapshot file.
    pub async fn remove(&self, owner: &str, asset_id: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self.entries.write().await;

        let next: Vec<WatchlistEntry> = entries
            .iter()
            .filter(|e| !e.matches(owner, asset_id))
            .cloned()
            .collect();

        if next.len() == entries.len() {
            return Ok(None);
        }

        let removed = entries.len() - next.len();
        self.commit(&mut entries, next).await?;

        tracing::debug!("Watchlist remove: {} -> {} ({} entries)", owner, asset_id, removed);
        Ok(Some(asset_id.to_string()))
    }

    async fn commit(
        &self,
        current: &mut Vec<WatchlistEntry>,
        next: Vec<WatchlistEntry>,
    ) -> Result<(), StoreError> {
        if let Err(e) = write_snapshot(&self.path, &next).await {
            tracing::error!("Failed to persist watchlist to {}: {}", self.path.display(), e);
            return Err(e);
        }
        *current = next;
        Ok(())
    }
}
