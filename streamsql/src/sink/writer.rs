use crate::error::{StreamSQLError, StreamSQLResult};
use crate::event::ChangeRecord;
use crate::sink::store::ChangeStore;
use log::{error, info, warn};
use tokio::sync::mpsc;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct WriterStats {
    pub written: u64,
    pub failed: u64,
}

/// Drains change records into a [`ChangeStore`], one insert per record.
/// Failed records are logged and dropped.
pub struct ChangeStoreWriter<S: ChangeStore> {
    store: S,
}

impl<S: ChangeStore> ChangeStoreWriter<S> {
    pub fn new(store: S) -> Self {
        ChangeStoreWriter { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns `false` when the schema could not be created. Inserts are still
    /// attempted afterwards against a table provisioned by other means.
    pub async fn ensure_schema(&self) -> bool {
        match self.store.ensure_schema().await {
            Ok(()) => true,
            Err(err) => {
                warn!("Failed to create the change table: {}", err);
                warn!("Continuing; the change table must already exist");
                false
            }
        }
    }

    pub async fn append(&self, record: &ChangeRecord) -> StreamSQLResult<()> {
        self.store.append(record).await.map_err(|err| match err {
            StreamSQLError::WriteError(_) => err,
            other => StreamSQLError::WriteError(other.to_string()),
        })
    }

    /// Runs until every sender of `records` is dropped.
    pub async fn run(&self, mut records: mpsc::Receiver<ChangeRecord>) -> WriterStats {
        let mut stats = WriterStats::default();
        while let Some(record) = records.recv().await {
            match self.append(&record).await {
                Ok(()) => stats.written += 1,
                Err(err) => {
                    stats.failed += 1;
                    error!(
                        "{} ({} on {} from {}, ID: {:?})",
                        err,
                        record.operation,
                        record.source_table,
                        record.source_database,
                        record.record_id
                    );
                }
            }
        }
        info!(
            "Change writer stopped: {} written, {} failed",
            stats.written, stats.failed
        );
        stats
    }
}
