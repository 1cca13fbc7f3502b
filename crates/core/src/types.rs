/// All ledger primary keys are UUIDv7, generated by the service on insert.
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Structured entity state as captured before or after a mutation.
pub type Snapshot = serde_json::Map<String, serde_json::Value>;

/// Generate a new time-ordered primary key.
pub fn new_id() -> DbId {
    uuid::Uuid::now_v7()
}
