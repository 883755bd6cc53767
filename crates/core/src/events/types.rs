use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One server-pushed change notification for a watched table.
///
/// The payload mirrors the hosted backend's change feed:
/// `{eventType: INSERT|UPDATE|DELETE, new: {...}, old: {id}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    #[serde(flatten)]
    pub op: ChangeOp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "UPPERCASE")]
pub enum ChangeOp {
    Insert { new: Value },
    Update { new: Value },
    Delete { old: RecordRef },
}

/// Delete events carry only the id of the removed row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordRef {
    pub id: Uuid,
}

/// A change event decoded against a concrete record type.
#[derive(Debug, Clone)]
pub enum Change<R> {
    Inserted(R),
    Updated(R),
    Deleted(Uuid),
}

impl ChangeOp {
    /// Decode the raw row payload into a typed change. Fails when the row
    /// does not deserialize as `R`; callers log and skip such events rather
    /// than poisoning their collection.
    pub fn decode<R: DeserializeOwned>(self) -> Result<Change<R>, serde_json::Error> {
        Ok(match self {
            ChangeOp::Insert { new } => Change::Inserted(serde_json::from_value(new)?),
            ChangeOp::Update { new } => Change::Updated(serde_json::from_value(new)?),
            ChangeOp::Delete { old } => Change::Deleted(old.id),
        })
    }
}
