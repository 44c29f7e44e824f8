use crate::error::StreamSQLResult;
use crate::event::ChangeRecord;
use async_trait::async_trait;

/// Durable, append-only destination for change records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChangeStore: Send + Sync {
    /// Creates the change table and its indexes when they do not exist.
    async fn ensure_schema(&self) -> StreamSQLResult<()>;

    /// Appends one record in its own transaction.
    async fn append(&self, record: &ChangeRecord) -> StreamSQLResult<()>;
}
