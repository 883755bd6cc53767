use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use lab_sync_core::events::bus::ChangeBus;
use lab_sync_core::events::types::{ChangeEvent, ChangeOp, RecordRef};

use crate::backend::{Backend, Direction, ObjectStore};
use crate::error::BackendError;

/// In-process stand-in for the hosted backend: JSON rows in per-table
/// vectors, objects in a flat map, change events over a [`ChangeBus`].
/// Serves as the injected test double and as the demo's data source.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    objects: Mutex<HashMap<String, Vec<u8>>>,
    bus: ChangeBus,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bus_capacity(capacity: usize) -> Self {
        Self {
            bus: ChangeBus::new(capacity),
            ..Self::default()
        }
    }

    /// The underlying change feed, exposed for tests that publish or count
    /// subscribers directly.
    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    /// Whether an uploaded object is still stored.
    pub fn has_object(&self, bucket: &str, path: &str) -> bool {
        let objects = self.objects.lock().expect("object map poisoned");
        objects.contains_key(&object_key(bucket, path))
    }

    fn row_id(row: &Value) -> Option<Uuid> {
        row.get("id")
            .and_then(Value::as_str)
            .and_then(|s| Uuid::parse_str(s).ok())
    }
}

fn object_key(bucket: &str, path: &str) -> String {
    format!("{bucket}/{path}")
}

/// Order two JSON scalars the way the backend would order a column;
/// timestamps compare as instants, everything else falls back to its
/// natural scalar ordering.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    if let (Some(a), Some(b)) = (as_timestamp(a), as_timestamp(b)) {
        return a.cmp(&b);
    }
    match (a, b) {
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn fetch_all(
        &self,
        table: &str,
        order_by: &str,
        direction: Direction,
    ) -> Result<Vec<Value>, BackendError> {
        let tables = self.tables.lock().expect("table map poisoned");
        let mut rows = tables.get(table).cloned().unwrap_or_default();
        rows.sort_by(|a, b| {
            let ord = compare_values(
                a.get(order_by).unwrap_or(&Value::Null),
                b.get(order_by).unwrap_or(&Value::Null),
            );
            match direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            }
        });
        Ok(rows)
    }

    async fn fetch_one(&self, table: &str, id: Uuid) -> Result<Value, BackendError> {
        let tables = self.tables.lock().expect("table map poisoned");
        tables
            .get(table)
            .and_then(|rows| rows.iter().find(|r| Self::row_id(r) == Some(id)))
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, BackendError> {
        let Value::Object(mut fields) = row else {
            return Err(BackendError::Storage("row must be a JSON object".into()));
        };
        fields.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        fields.insert(
            "created_at".into(),
            Value::String(Utc::now().to_rfc3339()),
        );
        let stored = Value::Object(fields);

        let mut tables = self.tables.lock().expect("table map poisoned");
        tables
            .entry(table.to_string())
            .or_default()
            .push(stored.clone());
        drop(tables);

        self.bus.publish(ChangeEvent {
            table: table.to_string(),
            op: ChangeOp::Insert {
                new: stored.clone(),
            },
        });
        Ok(stored)
    }

    async fn update(&self, table: &str, id: Uuid, patch: Value) -> Result<Value, BackendError> {
        let Value::Object(patch) = patch else {
            return Err(BackendError::Storage("patch must be a JSON object".into()));
        };

        let mut tables = self.tables.lock().expect("table map poisoned");
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| Self::row_id(r) == Some(id)))
            .ok_or(BackendError::NotFound)?;
        let Some(fields) = row.as_object_mut() else {
            return Err(BackendError::Storage("stored row is not an object".into()));
        };
        for (key, value) in patch {
            fields.insert(key, value);
        }
        let stored = row.clone();
        drop(tables);

        self.bus.publish(ChangeEvent {
            table: table.to_string(),
            op: ChangeOp::Update {
                new: stored.clone(),
            },
        });
        Ok(stored)
    }

    async fn delete(&self, table: &str, id: Uuid) -> Result<(), BackendError> {
        let mut tables = self.tables.lock().expect("table map poisoned");
        let removed = match tables.get_mut(table) {
            Some(rows) => {
                let before = rows.len();
                rows.retain(|r| Self::row_id(r) != Some(id));
                rows.len() < before
            }
            None => false,
        };
        drop(tables);

        // Deleting an absent row is not an error, but only a real removal
        // produces an event.
        if removed {
            self.bus.publish(ChangeEvent {
                table: table.to_string(),
                op: ChangeOp::Delete {
                    old: RecordRef { id },
                },
            });
        }
        Ok(())
    }

    fn changes(&self, table: &str) -> broadcast::Receiver<ChangeEvent> {
        self.bus.subscribe(table)
    }
}

#[async_trait]
impl ObjectStore for MemoryBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
    ) -> Result<String, BackendError> {
        let mut objects = self.objects.lock().expect("object map poisoned");
        objects.insert(object_key(bucket, path), bytes);
        Ok(path.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("mem://{bucket}/{path}")
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError> {
        let mut objects = self.objects.lock().expect("object map poisoned");
        for path in paths {
            objects.remove(&object_key(bucket, path));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_assigns_id_and_created_at_and_emits() {
        let backend = MemoryBackend::new();
        let mut feed = backend.changes("posts");

        let stored = backend
            .insert("posts", json!({ "name": "Scope" }))
            .await
            .unwrap();

        assert!(MemoryBackend::row_id(&stored).is_some());
        assert!(as_timestamp(&stored["created_at"]).is_some());

        let event = feed.recv().await.unwrap();
        assert!(matches!(event.op, ChangeOp::Insert { ref new } if new == &stored));
    }

    #[tokio::test]
    async fn update_merges_patch_fields() {
        let backend = MemoryBackend::new();
        let stored = backend
            .insert("posts", json!({ "name": "Scope", "status": "Available" }))
            .await
            .unwrap();
        let id = MemoryBackend::row_id(&stored).unwrap();

        let updated = backend
            .update("posts", id, json!({ "status": "Not Available" }))
            .await
            .unwrap();

        assert_eq!(updated["name"], "Scope");
        assert_eq!(updated["status"], "Not Available");
        assert_eq!(updated["id"], stored["id"]);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let backend = MemoryBackend::new();
        let err = backend
            .update("posts", Uuid::new_v4(), json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::NotFound));
    }

    #[tokio::test]
    async fn delete_emits_only_when_a_row_was_removed() {
        let backend = MemoryBackend::new();
        let stored = backend.insert("posts", json!({ "name": "x" })).await.unwrap();
        let id = MemoryBackend::row_id(&stored).unwrap();
        let mut feed = backend.changes("posts");

        backend.delete("posts", Uuid::new_v4()).await.unwrap();
        backend.delete("posts", id).await.unwrap();

        let event = feed.recv().await.unwrap();
        assert!(matches!(event.op, ChangeOp::Delete { ref old } if old.id == id));
        assert!(feed.try_recv().is_err());
    }

    #[tokio::test]
    async fn fetch_all_orders_by_created_at_descending() {
        let backend = MemoryBackend::new();
        backend.insert("posts", json!({ "name": "first" })).await.unwrap();
        backend.insert("posts", json!({ "name": "second" })).await.unwrap();

        let rows = backend
            .fetch_all("posts", "created_at", Direction::Descending)
            .await
            .unwrap();

        assert_eq!(rows[0]["name"], "second");
        assert_eq!(rows[1]["name"], "first");
    }

    #[tokio::test]
    async fn objects_upload_and_remove() {
        let backend = MemoryBackend::new();
        let path = backend
            .upload("uploads", "1_scope.png", vec![1, 2, 3])
            .await
            .unwrap();
        assert!(backend.has_object("uploads", &path));
        assert_eq!(backend.public_url("uploads", &path), "mem://uploads/1_scope.png");

        backend.remove("uploads", &[path.clone()]).await.unwrap();
        assert!(!backend.has_object("uploads", &path));
    }
}
