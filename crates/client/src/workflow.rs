use chrono::Utc;
use uuid::Uuid;

use lab_sync_core::record::model::{Draft, Record};

use crate::backend::{ObjectStore, TableClient};
use crate::error::{SyncError, SyncResult};

/// A binary asset to store alongside a record, e.g. an equipment photo.
#[derive(Debug, Clone)]
pub struct AssetUpload {
    pub path: String,
    pub bytes: Vec<u8>,
}

impl AssetUpload {
    /// Build an upload under a timestamp-prefixed path so re-uploads of the
    /// same file name never collide.
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            path: format!("{}_{}", Utc::now().timestamp_millis(), file_name),
            bytes,
        }
    }
}

/// Create or update a record, uploading its asset first.
///
/// The draft is validated before anything leaves the client. If an asset is
/// supplied it is uploaded and its public URL attached to the draft; an
/// upload failure aborts the write entirely. With `existing` set the draft
/// updates that record in place, otherwise it inserts a new one. The local
/// collection is never mutated optimistically — views converge through the
/// change feed.
pub async fn save_record<R, D>(
    client: &TableClient<R>,
    store: &dyn ObjectStore,
    mut draft: D,
    asset: Option<AssetUpload>,
    existing: Option<Uuid>,
) -> SyncResult<R>
where
    R: Record,
    D: Draft,
{
    draft.validate()?;

    if let Some(asset) = asset {
        let stored = store
            .upload(R::ASSET_BUCKET, &asset.path, asset.bytes)
            .await
            .map_err(SyncError::Upload)?;
        draft.attach_asset_url(store.public_url(R::ASSET_BUCKET, &stored));
    }

    match existing {
        Some(id) => client.update(id, &draft).await,
        None => client.insert(&draft).await,
    }
}

/// Delete a record, then clean up its stored asset best-effort.
///
/// The row delete commits first and is authoritative; a failure removing the
/// asset afterwards is logged and swallowed, never rolled back into the
/// record operation.
pub async fn delete_record<R: Record>(
    client: &TableClient<R>,
    store: &dyn ObjectStore,
    record: &R,
) -> SyncResult<()> {
    client.delete(record.id()).await?;

    if let Some(path) = record.asset_url().and_then(object_path) {
        if let Err(err) = store.remove(R::ASSET_BUCKET, &[path]).await {
            tracing::warn!(
                table = R::TABLE,
                id = %record.id(),
                error = %err,
                "asset cleanup failed after record delete"
            );
        }
    }
    Ok(())
}

/// Recover the stored object path from a public URL — the last path segment,
/// which is how uploads are keyed.
pub fn object_path(url: &str) -> Option<String> {
    url.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_path_takes_last_segment() {
        assert_eq!(
            object_path("https://cdn.example/storage/uploads/1693_scope.png"),
            Some("1693_scope.png".to_string())
        );
    }

    #[test]
    fn object_path_rejects_trailing_slash() {
        assert_eq!(object_path("https://cdn.example/uploads/"), None);
    }

    #[test]
    fn asset_upload_prefixes_file_name() {
        let upload = AssetUpload::new("scope.png", vec![1, 2, 3]);
        assert!(upload.path.ends_with("_scope.png"));
        assert_ne!(upload.path, "scope.png");
    }
}
