//! Persistence of search records.
//!
//! The fjall backend keeps postcard-encoded records keyed by big-endian id, an
//! index of live ids, and the id counter in a separate `meta` keyspace.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use fjall::Keyspace;
use tokio::sync::{Mutex, RwLock};
use tokio::task;
use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::models::SearchRecord;
use crate::{JournalError, Result};

const NEXT_ID_KEY: &str = "next_id";
const INDEX_KEY: &str = "ids";

/// Row store for [`SearchRecord`]s keyed by id
#[async_trait]
pub trait SearchRepository: Send + Sync {
    /// Reserve a fresh id
    async fn next_id(&self) -> Result<u64>;
    /// Insert or overwrite a record
    async fn put(&self, record: &SearchRecord) -> Result<()>;
    async fn get(&self, id: u64) -> Result<Option<SearchRecord>>;
    /// Every record, in id order
    async fn list(&self) -> Result<Vec<SearchRecord>>;
    /// Returns whether a record was removed
    async fn delete(&self, id: u64) -> Result<bool>;
}

/// Open the backend named in the config
pub fn open(config: &StorageConfig) -> Result<Arc<dyn SearchRepository>> {
    match config.backend.as_str() {
        "memory" => {
            info!("Using in-memory search store");
            Ok(Arc::new(MemorySearchStore::new()))
        }
        "fjall" => {
            info!("Opening search store at {}", config.path);
            Ok(Arc::new(FjallSearchStore::open(&config.path)?))
        }
        other => Err(JournalError::config(format!("Unknown storage backend '{other}'"))),
    }
}

pub struct FjallSearchStore {
    records: Keyspace,
    meta: Keyspace,
    /// Serializes index and counter updates
    write_lock: Mutex<()>,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

fn record_key(id: u64) -> Vec<u8> {
    id.to_be_bytes().to_vec()
}

impl FjallSearchStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let records = db.keyspace("searches", fjall::KeyspaceCreateOptions::default)?;
        let meta = db.keyspace("meta", fjall::KeyspaceCreateOptions::default)?;
        Ok(Self {
            records,
            meta,
            write_lock: Mutex::new(()),
        })
    }

    async fn read_meta<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let store = self.meta.clone();
        let key = key.as_bytes().to_vec();
        let bytes = task::spawn_blocking(move || get_from_store(store, key)).await??;
        bytes
            .map(|b| postcard::from_bytes(&b).map_err(JournalError::from))
            .transpose()
    }

    async fn write_meta<T: serde::Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let store = self.meta.clone();
        let key = key.as_bytes().to_vec();
        let bytes = postcard::to_stdvec(value)?;
        task::spawn_blocking(move || store.insert(key, bytes)).await??;
        Ok(())
    }

    async fn index(&self) -> Result<Vec<u64>> {
        Ok(self.read_meta(INDEX_KEY).await?.unwrap_or_default())
    }
}

#[async_trait]
impl SearchRepository for FjallSearchStore {
    async fn next_id(&self) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        let id = self.read_meta::<u64>(NEXT_ID_KEY).await?.unwrap_or(1);
        self.write_meta(NEXT_ID_KEY, &(id + 1)).await?;
        Ok(id)
    }

    #[tracing::instrument(name = "put_record", level = "debug", skip(self, record), fields(id = record.id))]
    async fn put(&self, record: &SearchRecord) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let store = self.records.clone();
        let key = record_key(record.id);
        let bytes = postcard::to_stdvec(record)?;
        task::spawn_blocking(move || store.insert(key, bytes)).await??;

        let mut ids = self.index().await?;
        if let Err(pos) = ids.binary_search(&record.id) {
            ids.insert(pos, record.id);
            self.write_meta(INDEX_KEY, &ids).await?;
        }
        Ok(())
    }

    #[tracing::instrument(name = "get_record", level = "debug", skip(self))]
    async fn get(&self, id: u64) -> Result<Option<SearchRecord>> {
        let store = self.records.clone();
        let maybe_bytes = task::spawn_blocking(move || get_from_store(store, record_key(id))).await??;

        match maybe_bytes {
            Some(bytes) => Ok(Some(postcard::from_bytes(&bytes)?)),
            None => {
                debug!("Record not found");
                Ok(None)
            }
        }
    }

    async fn list(&self) -> Result<Vec<SearchRecord>> {
        let mut records = Vec::new();
        for id in self.index().await? {
            if let Some(record) = self.get(id).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    #[tracing::instrument(name = "delete_record", level = "debug", skip(self))]
    async fn delete(&self, id: u64) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let mut ids = self.index().await?;
        let Ok(pos) = ids.binary_search(&id) else {
            return Ok(false);
        };

        let store = self.records.clone();
        task::spawn_blocking(move || store.remove(record_key(id))).await??;
        ids.remove(pos);
        self.write_meta(INDEX_KEY, &ids).await?;
        Ok(true)
    }
}

/// Volatile store for the `memory` backend and tests
#[derive(Default)]
pub struct MemorySearchStore {
    records: RwLock<BTreeMap<u64, SearchRecord>>,
    next_id: Mutex<u64>,
}

impl MemorySearchStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SearchRepository for MemorySearchStore {
    async fn next_id(&self) -> Result<u64> {
        let mut next = self.next_id.lock().await;
        *next += 1;
        Ok(*next)
    }

    async fn put(&self, record: &SearchRecord) -> Result<()> {
        self.records.write().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn get(&self, id: u64) -> Result<Option<SearchRecord>> {
        Ok(self.records.read().await.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<SearchRecord>> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn delete(&self, id: u64) -> Result<bool> {
        Ok(self.records.write().await.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DaySource, RangeSummary};
    use crate::testing::{date, fake_day, london};
    use chrono::Utc;
    use tempfile::TempDir;

    fn record(id: u64, note: Option<&str>) -> SearchRecord {
        let days: Vec<_> = date("2024-01-01")
            .iter_days()
            .take(3)
            .map(|d| fake_day(d, DaySource::History))
            .collect();
        SearchRecord {
            id,
            query: "London".to_string(),
            location: london().into(),
            date_from: date("2024-01-01"),
            date_to: date("2024-01-03"),
            summary: RangeSummary {
                avg_temp_c: 3.0,
                avg_humidity: 72,
                max_wind_kph: 30.0,
                condition_text: "Cloudy day 1".to_string(),
                day_count: 3,
            },
            days,
            maps_url: Some("https://maps".to_string()),
            video_ids: vec!["abc".to_string()],
            note: note.map(str::to_string),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn exercise(store: &dyn SearchRepository) {
        let first = store.next_id().await.unwrap();
        let second = store.next_id().await.unwrap();
        assert!(second > first);

        store.put(&record(first, None)).await.unwrap();
        store.put(&record(second, Some("windy"))).await.unwrap();

        let loaded = store.get(second).await.unwrap().unwrap();
        assert_eq!(loaded.note.as_deref(), Some("windy"));
        assert_eq!(loaded.location.name, "London");
        assert_eq!(loaded.days, record(second, None).days);
        assert_eq!(loaded.video_ids, vec!["abc".to_string()]);

        store.put(&record(first, Some("updated"))).await.unwrap();
        let all = store.list().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].note.as_deref(), Some("updated"));

        assert!(store.delete(first).await.unwrap());
        assert!(!store.delete(first).await.unwrap());
        assert!(store.get(first).await.unwrap().is_none());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_memory_store() {
        exercise(&MemorySearchStore::new()).await;
    }

    #[tokio::test]
    async fn test_fjall_store() {
        let temp_dir = TempDir::new().unwrap();
        let store = FjallSearchStore::open(temp_dir.path()).unwrap();
        exercise(&store).await;
    }

    #[test]
    fn test_open_unknown_backend() {
        let config = StorageConfig {
            backend: "postgres".to_string(),
            path: String::new(),
        };
        assert!(matches!(open(&config), Err(JournalError::Config { .. })));
    }
}
