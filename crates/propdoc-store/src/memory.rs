//! In-memory store doubles for tests.
//!
//! Both stores implement the real traits plus failure injection and
//! inspection helpers, so orchestrator behavior around partial failure
//! (compensation, best-effort cleanup) can be exercised without a live
//! backend.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use propdoc_core::{Container, Error, ObjectStore, RecordKind, RecordStore, Result, WriteOutcome};

/// Base URL used for issued URLs, matching the hosted backend's shape.
pub const TEST_STORAGE_BASE_URL: &str = "https://storage.test/storage/v1";

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// In-memory object store.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<(Container, String), StoredObject>>,
    removed: Mutex<Vec<(Container, String)>>,
    fail_puts: AtomicBool,
    fail_removals: AtomicBool,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `put` calls fail with a storage write error.
    pub fn fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `remove` calls fail.
    pub fn fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, container: Container, path: &str) -> bool {
        self.objects
            .lock()
            .unwrap()
            .contains_key(&(container, path.to_string()))
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    /// Paths removed so far, in removal order.
    pub fn removed_paths(&self) -> Vec<(Container, String)> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(
        &self,
        container: Container,
        path: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<()> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(Error::StorageWrite("simulated put failure".to_string()));
        }
        self.objects.lock().unwrap().insert(
            (container, path.to_string()),
            StoredObject {
                data: data.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn issue_access_url(
        &self,
        container: Container,
        path: &str,
        ttl: Option<Duration>,
    ) -> Result<String> {
        Ok(match ttl {
            None => format!(
                "{}/object/public/{}/{}",
                TEST_STORAGE_BASE_URL,
                container.name(),
                path
            ),
            Some(_) => format!(
                "{}/object/sign/{}/{}?token=test-token",
                TEST_STORAGE_BASE_URL,
                container.name(),
                path
            ),
        })
    }

    async fn remove(&self, container: Container, paths: &[String]) -> Result<()> {
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(Error::Request("simulated removal failure".to_string()));
        }
        let mut objects = self.objects.lock().unwrap();
        let mut removed = self.removed.lock().unwrap();
        for path in paths {
            objects.remove(&(container, path.clone()));
            removed.push((container, path.clone()));
        }
        Ok(())
    }
}

/// In-memory record store.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: Mutex<HashMap<(RecordKind, String), Map<String, Value>>>,
    fail_writes: AtomicBool,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail with a metadata write error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Insert a record with the given initial metadata object.
    pub fn insert_record(&self, kind: RecordKind, record_id: &str, data: Value) {
        let map = match data {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => panic!("record data must be a JSON object, got {}", other),
        };
        self.records
            .lock()
            .unwrap()
            .insert((kind, record_id.to_string()), map);
    }

    /// Current value of one field, for assertions.
    pub fn field_value(&self, kind: RecordKind, record_id: &str, field: &str) -> Option<Value> {
        self.records
            .lock()
            .unwrap()
            .get(&(kind, record_id.to_string()))
            .map(|map| map.get(field).cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn read_field(&self, kind: RecordKind, record_id: &str, field: &str) -> Result<Value> {
        let records = self.records.lock().unwrap();
        let map = records.get(&(kind, record_id.to_string())).ok_or_else(|| {
            Error::RecordNotFound {
                kind,
                id: record_id.to_string(),
            }
        })?;
        Ok(map.get(field).cloned().unwrap_or(Value::Null))
    }

    async fn write_field(
        &self,
        kind: RecordKind,
        record_id: &str,
        field: &str,
        value: &Value,
    ) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::MetadataWrite("simulated write failure".to_string()));
        }
        let mut records = self.records.lock().unwrap();
        let map = records
            .get_mut(&(kind, record_id.to_string()))
            .ok_or_else(|| Error::RecordNotFound {
                kind,
                id: record_id.to_string(),
            })?;
        map.insert(field.to_string(), value.clone());
        Ok(())
    }

    async fn write_field_checked(
        &self,
        kind: RecordKind,
        record_id: &str,
        field: &str,
        expected: &Value,
        value: &Value,
    ) -> Result<WriteOutcome> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::MetadataWrite("simulated write failure".to_string()));
        }
        let mut records = self.records.lock().unwrap();
        let map = records
            .get_mut(&(kind, record_id.to_string()))
            .ok_or_else(|| Error::RecordNotFound {
                kind,
                id: record_id.to_string(),
            })?;
        let current = map.get(field).cloned().unwrap_or(Value::Null);
        if &current != expected {
            return Ok(WriteOutcome::Conflict);
        }
        map.insert(field.to_string(), value.clone());
        Ok(WriteOutcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_read_field_missing_record() {
        let store = InMemoryRecordStore::new();
        let err = store
            .read_field(RecordKind::Property, "P-404", "doc_energy_cert")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RecordNotFound { .. }));
    }

    #[tokio::test]
    async fn test_read_field_unwritten_field_is_null() {
        let store = InMemoryRecordStore::new();
        store.insert_record(RecordKind::Property, "P-1", json!({}));
        let value = store
            .read_field(RecordKind::Property, "P-1", "doc_energy_cert")
            .await
            .unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_write_field_checked_detects_conflict() {
        let store = InMemoryRecordStore::new();
        store.insert_record(RecordKind::Property, "P-1", json!({"gallery_photos": ["a"]}));

        let outcome = store
            .write_field_checked(
                RecordKind::Property,
                "P-1",
                "gallery_photos",
                &json!(["a"]),
                &json!(["a", "b"]),
            )
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Applied);

        // Guard value is now stale.
        let outcome = store
            .write_field_checked(
                RecordKind::Property,
                "P-1",
                "gallery_photos",
                &json!(["a"]),
                &json!(["a", "c"]),
            )
            .await
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Conflict);
        assert_eq!(
            store.field_value(RecordKind::Property, "P-1", "gallery_photos"),
            Some(json!(["a", "b"]))
        );
    }

    #[tokio::test]
    async fn test_object_store_put_and_remove() {
        let store = InMemoryObjectStore::new();
        store
            .put(Container::Public, "P-1/a.jpg", b"img", "image/jpeg")
            .await
            .unwrap();
        assert!(store.contains(Container::Public, "P-1/a.jpg"));

        store
            .remove(Container::Public, &["P-1/a.jpg".to_string()])
            .await
            .unwrap();
        assert!(!store.contains(Container::Public, "P-1/a.jpg"));
        assert_eq!(store.removed_paths().len(), 1);
    }

    #[tokio::test]
    async fn test_object_store_failure_injection() {
        let store = InMemoryObjectStore::new();
        store.fail_puts(true);
        let err = store
            .put(Container::Public, "P-1/a.jpg", b"img", "image/jpeg")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StorageWrite(_)));
    }
}
