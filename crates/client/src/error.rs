use lab_sync_core::record::validate::ValidationError;

/// Failure reported by a backend or object-store implementation.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("not found")]
    NotFound,

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("permission denied: {0}")]
    Denied(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Call-site classification of a failed user action.
///
/// Fetch failures degrade to an empty collection and are logged; write and
/// upload failures are returned to the caller so the UI can surface them.
/// None of these carry a retry policy — every failure is terminal for the
/// action that triggered it.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("fetch failed: {0}")]
    Fetch(#[source] BackendError),

    #[error("write failed: {0}")]
    Write(#[source] BackendError),

    #[error("asset upload failed: {0}")]
    Upload(#[source] BackendError),

    #[error("row did not decode: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
}

/// Convenience alias for client operations.
pub type SyncResult<T> = Result<T, SyncError>;
