use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::validate::ValidationError;

/// One row of domain data as stored by the hosted backend.
///
/// Implementations pair a backend table with an optional asset bucket so
/// generic plumbing (fetch, reconcile, upload, cleanup) never needs to know
/// which domain it is moving.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Backend table this record type lives in.
    const TABLE: &'static str;
    /// Storage bucket holding this record type's uploaded assets.
    const ASSET_BUCKET: &'static str;

    /// Backend-assigned identifier, stable for the record's lifetime.
    fn id(&self) -> Uuid;

    /// Backend-assigned creation timestamp, immutable.
    fn created_at(&self) -> DateTime<Utc>;

    /// Public URL of the uploaded asset associated with this record, if any.
    fn asset_url(&self) -> Option<&str>;
}

/// Editor-supplied payload for an insert or update: the record's mutable
/// fields without the backend-assigned `id` / `created_at`.
pub trait Draft: Serialize + Send + Sync {
    /// Check required fields before any write is attempted.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Record the public URL of a freshly uploaded asset on the payload.
    fn attach_asset_url(&mut self, url: String);
}
