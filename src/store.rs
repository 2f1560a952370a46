use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;

use crate::ports::store::{StorageError, Store};
use crate::types::push::Subscription;

/// Server dedup ledger row: at most one per milestone key, upserted on each
/// broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastRecord {
    pub milestone_key: String,
    #[serde(with = "time::serde::rfc3339")]
    pub sent_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreData {
    subscriptions: Vec<Subscription>,
    broadcasts: Vec<BroadcastRecord>,
}

/// JSON-file-backed store. All writes happen under one mutex and are flushed
/// to disk before the lock is released, which serializes conflicting
/// upsert/delete calls on the same endpoint.
#[derive(Clone)]
pub struct FileStore {
    path: PathBuf,
    data: Arc<Mutex<StoreData>>,
}

impl FileStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let data = match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|err| StorageError::new(format!("{}: {err}", path.display())))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(err) => {
                return Err(StorageError::new(format!("{}: {err}", path.display())));
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            data: Arc::new(Mutex::new(data)),
        })
    }

    fn persist(&self, data: &StoreData) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(data)
            .map_err(|err| StorageError::new(err.to_string()))?;
        std::fs::write(&self.path, raw)
            .map_err(|err| StorageError::new(format!("{}: {err}", self.path.display())))
    }
}

impl Store for FileStore {
    fn upsert_subscription(&self, subscription: &Subscription) -> Result<(), StorageError> {
        let mut data = self.data.lock().expect("store lock");
        match data
            .subscriptions
            .iter_mut()
            .find(|existing| existing.endpoint == subscription.endpoint)
        {
            Some(existing) => *existing = subscription.clone(),
            None => data.subscriptions.push(subscription.clone()),
        }
        self.persist(&data)
    }

    fn remove_subscription(&self, endpoint: &str) -> Result<(), StorageError> {
        let mut data = self.data.lock().expect("store lock");
        let before = data.subscriptions.len();
        data.subscriptions
            .retain(|subscription| subscription.endpoint != endpoint);
        if data.subscriptions.len() == before {
            return Ok(());
        }
        self.persist(&data)
    }

    fn list_subscriptions(&self) -> Result<Vec<Subscription>, StorageError> {
        let data = self.data.lock().expect("store lock");
        Ok(data.subscriptions.clone())
    }

    fn last_broadcast(&self, milestone_key: &str) -> Result<Option<OffsetDateTime>, StorageError> {
        let data = self.data.lock().expect("store lock");
        Ok(data
            .broadcasts
            .iter()
            .find(|record| record.milestone_key == milestone_key)
            .map(|record| record.sent_at))
    }

    fn record_broadcast(
        &self,
        milestone_key: &str,
        sent_at: OffsetDateTime,
    ) -> Result<(), StorageError> {
        let mut data = self.data.lock().expect("store lock");
        match data
            .broadcasts
            .iter_mut()
            .find(|record| record.milestone_key == milestone_key)
        {
            Some(record) => record.sent_at = sent_at,
            None => data.broadcasts.push(BroadcastRecord {
                milestone_key: milestone_key.to_string(),
                sent_at,
            }),
        }
        self.persist(&data)
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use time::Duration;
    use time::format_description::well_known::Rfc3339;

    fn create_temp_store(test_name: &str) -> (PathBuf, FileStore) {
        let mut root = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        root.push(format!("tminus-{test_name}-{nanos}"));
        std::fs::create_dir_all(&root).expect("create temp dir");
        let path = root.join("store.json");
        let store = FileStore::open(&path).expect("open store");
        (root, store)
    }

    fn subscription(endpoint: &str, p256dh: &str, auth: &str) -> Subscription {
        Subscription {
            endpoint: endpoint.to_string(),
            p256dh: p256dh.to_string(),
            auth: auth.to_string(),
            user_id: None,
        }
    }

    #[test]
    fn upsert_subscription__should_replace_keys_for_same_endpoint() {
        // Given
        let (root, store) = create_temp_store("upsert-replace");
        let endpoint = "https://push.example/123";
        store
            .upsert_subscription(&subscription(endpoint, "old-p256", "old-auth"))
            .expect("first upsert");

        // When
        store
            .upsert_subscription(&subscription(endpoint, "new-p256", "new-auth"))
            .expect("second upsert");

        // Then
        let stored = store.list_subscriptions().expect("list");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].endpoint, endpoint);
        assert_eq!(stored[0].p256dh, "new-p256");
        assert_eq!(stored[0].auth, "new-auth");

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[test]
    fn remove_subscription__should_ignore_absent_endpoint() {
        // Given
        let (root, store) = create_temp_store("remove-absent");

        // When / Then
        store
            .remove_subscription("https://push.example/missing")
            .expect("remove absent endpoint");

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[test]
    fn remove_subscription__should_delete_matching_endpoint_only() {
        // Given
        let (root, store) = create_temp_store("remove-one");
        store
            .upsert_subscription(&subscription("https://push.example/1", "p", "a"))
            .expect("upsert 1");
        store
            .upsert_subscription(&subscription("https://push.example/2", "p", "a"))
            .expect("upsert 2");

        // When
        store
            .remove_subscription("https://push.example/1")
            .expect("remove");

        // Then
        let stored = store.list_subscriptions().expect("list");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].endpoint, "https://push.example/2");

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[test]
    fn file_store__should_survive_reopen() {
        // Given
        let (root, store) = create_temp_store("reopen");
        let path = root.join("store.json");
        store
            .upsert_subscription(&subscription("https://push.example/123", "p256", "auth"))
            .expect("upsert");
        let sent_at = OffsetDateTime::parse("2026-11-19T08:00:00Z", &Rfc3339).expect("parse");
        store.record_broadcast("h1", sent_at).expect("record");
        drop(store);

        // When
        let reopened = FileStore::open(&path).expect("reopen store");

        // Then
        let stored = reopened.list_subscriptions().expect("list");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].endpoint, "https://push.example/123");
        assert_eq!(
            reopened.last_broadcast("h1").expect("last broadcast"),
            Some(sent_at)
        );

        std::fs::remove_dir_all(&root).expect("cleanup");
    }

    #[test]
    fn record_broadcast__should_upsert_per_milestone_key() {
        // Given
        let (root, store) = create_temp_store("broadcast-upsert");
        let first = OffsetDateTime::parse("2026-11-19T08:00:00Z", &Rfc3339).expect("parse");
        let second = first + Duration::hours(2);
        store.record_broadcast("h1", first).expect("first record");
        store.record_broadcast("d1", first).expect("other key");

        // When
        store.record_broadcast("h1", second).expect("second record");

        // Then
        assert_eq!(store.last_broadcast("h1").expect("h1"), Some(second));
        assert_eq!(store.last_broadcast("d1").expect("d1"), Some(first));
        assert_eq!(store.last_broadcast("min5").expect("min5"), None);

        std::fs::remove_dir_all(&root).expect("cleanup");
    }
}
