use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use lab_sync_core::events::types::ChangeEvent;
use lab_sync_core::record::model::{Draft, Record};

use crate::error::{BackendError, SyncError, SyncResult};

/// Sort direction for a table read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// The hosted relational backend, consumed as a black box and injected
/// explicitly wherever data is read or written. Rows cross this seam as raw
/// JSON objects; typing happens in [`TableClient`].
#[async_trait]
pub trait Backend: Send + Sync {
    /// Read every row of a table, sorted server-side.
    async fn fetch_all(
        &self,
        table: &str,
        order_by: &str,
        direction: Direction,
    ) -> Result<Vec<Value>, BackendError>;

    /// Read a single row by id.
    async fn fetch_one(&self, table: &str, id: Uuid) -> Result<Value, BackendError>;

    /// Insert a row; the backend assigns `id` and `created_at` and returns
    /// the stored row.
    async fn insert(&self, table: &str, row: Value) -> Result<Value, BackendError>;

    /// Merge the patch's fields into the row with the given id and return
    /// the stored row.
    async fn update(&self, table: &str, id: Uuid, patch: Value) -> Result<Value, BackendError>;

    /// Delete the row with the given id. Deleting an absent row is not an
    /// error.
    async fn delete(&self, table: &str, id: Uuid) -> Result<(), BackendError>;

    /// Open one receiver on the managed change feed for a table.
    fn changes(&self, table: &str) -> broadcast::Receiver<ChangeEvent>;
}

/// The hosted object storage, likewise a black box.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `bucket/path`, returning the stored path.
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>)
        -> Result<String, BackendError>;

    /// Public URL serving a stored object.
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Remove stored objects. Best-effort callers log and ignore failures.
    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), BackendError>;
}

/// Typed view of one backend table, doing the JSON row ↔ record conversion
/// for a concrete [`Record`] type.
pub struct TableClient<R> {
    backend: Arc<dyn Backend>,
    _record: PhantomData<R>,
}

impl<R> Clone for TableClient<R> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            _record: PhantomData,
        }
    }
}

impl<R: Record> TableClient<R> {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            _record: PhantomData,
        }
    }

    /// Full read of the table, newest first.
    pub async fn fetch_all(&self) -> SyncResult<Vec<R>> {
        self.fetch_all_ordered("created_at", Direction::Descending)
            .await
    }

    /// Full read of the table with an explicit sort key.
    pub async fn fetch_all_ordered(
        &self,
        order_by: &str,
        direction: Direction,
    ) -> SyncResult<Vec<R>> {
        let rows = self
            .backend
            .fetch_all(R::TABLE, order_by, direction)
            .await
            .map_err(SyncError::Fetch)?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(SyncError::from))
            .collect()
    }

    /// Read one record by id, e.g. for a detail view resolved from a route
    /// parameter.
    pub async fn fetch_one(&self, id: Uuid) -> SyncResult<R> {
        let row = self
            .backend
            .fetch_one(R::TABLE, id)
            .await
            .map_err(SyncError::Fetch)?;
        Ok(serde_json::from_value(row)?)
    }

    pub async fn insert(&self, draft: &impl Draft) -> SyncResult<R> {
        let row = serde_json::to_value(draft)?;
        let stored = self
            .backend
            .insert(R::TABLE, row)
            .await
            .map_err(SyncError::Write)?;
        Ok(serde_json::from_value(stored)?)
    }

    pub async fn update(&self, id: Uuid, draft: &impl Draft) -> SyncResult<R> {
        let patch = serde_json::to_value(draft)?;
        let stored = self
            .backend
            .update(R::TABLE, id, patch)
            .await
            .map_err(SyncError::Write)?;
        Ok(serde_json::from_value(stored)?)
    }

    pub async fn delete(&self, id: Uuid) -> SyncResult<()> {
        self.backend
            .delete(R::TABLE, id)
            .await
            .map_err(SyncError::Write)
    }
}
