use crate::event::operation::OperationKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One normalized change, ready to be appended to the change store.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    /// `DB1 (TestCDC)`
    pub source_database: String,
    pub source_table: String,
    pub source_server: String,
    pub topic_name: String,
    pub operation: OperationKind,
    pub record_id: Option<String>,
    /// Source-side event time in milliseconds, `0` when the envelope has none.
    pub origin_ts_ms: i64,
    pub change_timestamp: DateTime<Utc>,
    pub before_data: Option<String>,
    pub after_data: Option<String>,
    pub full_payload: String,
    pub processed_at: DateTime<Utc>,
}
