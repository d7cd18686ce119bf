use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::models::WatchlistEntry;

/// Read the snapshot file. Any failure yields an empty collection.
pub(crate) async fn load_snapshot(path: &Path) -> Vec<WatchlistEntry> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!("No watchlist file at {}, starting empty", path.display());
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!("Could not read watchlist file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    let rows: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!("Malformed watchlist file {}: {}", path.display(), e);
            return Vec::new();
        }
    };

    // Bad rows are dropped one by one so they cannot take valid rows with them
    let total = rows.len();
    let entries: Vec<WatchlistEntry> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value::<WatchlistEntry>(row) {
            Ok(entry) if entry.is_valid() => Some(entry),
            Ok(_) => {
                tracing::warn!("Skipping watchlist row {} with empty user or id", index);
                None
            }
            Err(e) => {
                tracing::warn!("Skipping unreadable watchlist row {}: {}", index, e);
                None
            }
        })
        .collect();

    if entries.len() < total {
        tracing::warn!(
            "Dropped {} of {} watchlist rows from {}",
            total - entries.len(),
            total,
            path.display()
        );
    }

    entries
}

/// Overwrite the snapshot file with the full collection.
///
/// Writes to a sibling temp file first and renames it over the target, so a
/// crash mid-write never leaves a truncated snapshot behind.
pub(crate) async fn write_snapshot(path: &Path, entries: &[WatchlistEntry]) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(entries)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = temp_path(path);
    let written = match tokio::fs::write(&tmp, json.as_bytes()).await {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "watchlist".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let entries = load_snapshot(&dir.path().join("absent.json")).await;
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("watchList.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(load_snapshot(&path).await.is_empty());
    }

    #[tokio::test]
    async fn test_non_array_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("watchList.json");
        std::fs::write(&path, r#"{"user":"alice","id":"bitcoin","symbol":"BTC"}"#).unwrap();

        assert!(load_snapshot(&path).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_entries_are_dropped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("watchList.json");
        std::fs::write(
            &path,
            r#"[{"user":"","id":"bitcoin","symbol":"BTC"},{"user":"alice","id":"eth","symbol":"ETH"}]"#,
        )
        .unwrap();

        let entries = load_snapshot(&path).await;
        assert_eq!(entries, vec![WatchlistEntry::new("alice", "eth", "ETH")]);
    }

    #[tokio::test]
    async fn test_mixed_file_keeps_valid_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("watchList.json");
        std::fs::write(
            &path,
            r#"[
                {"user":"alice","id":"bitcoin","symbol":"BTC"},
                {"user":"bob","id":1,"symbol":"X"},
                {"user":"carol","id":"solana"},
                "not an object",
                {"user":"dave","id":"eth","symbol":"ETH","note":"extra fields are fine"}
            ]"#,
        )
        .unwrap();

        let entries = load_snapshot(&path).await;
        assert_eq!(
            entries,
            vec![
                WatchlistEntry::new("alice", "bitcoin", "BTC"),
                WatchlistEntry::new("dave", "eth", "ETH"),
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_temp_write_is_cleaned_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("watchList.json");
        let tmp = temp_path(&path);
        // Dangling link: opening it for write fails because the target dir is missing
        std::os::unix::fs::symlink(dir.path().join("missing").join("target"), &tmp).unwrap();

        let result = write_snapshot(&path, &[WatchlistEntry::new("alice", "bitcoin", "BTC")]).await;

        assert!(matches!(result, Err(StoreError::Persistence(_))));
        assert!(std::fs::symlink_metadata(&tmp).is_err());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_write_is_pretty_and_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("watchList.json");

        write_snapshot(&path, &[WatchlistEntry::new("alice", "bitcoin", "BTC")])
            .await
            .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  {"));
        assert!(raw.contains("\"user\": \"alice\""));
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path(Path::new("/data/watchList.json"));
        assert_eq!(tmp, PathBuf::from("/data/watchList.json.tmp"));
    }
}
