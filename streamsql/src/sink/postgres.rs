use crate::error::{StreamSQLError, StreamSQLResult};
use crate::event::ChangeRecord;
use crate::sink::config::SinkConfig;
use crate::sink::store::ChangeStore;
use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use log::{debug, info};
use regex::Regex;
use tokio_postgres::NoTls;

const TABLE_NAME_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$";

/// Only plain `table` or `schema.table` identifiers are accepted, since the
/// name is spliced into DDL and DML.
pub fn validate_table_name(table: &str) -> StreamSQLResult<()> {
    let pattern = Regex::new(TABLE_NAME_PATTERN)
        .map_err(|err| StreamSQLError::ConfigError(err.to_string()))?;
    if pattern.is_match(table) {
        Ok(())
    } else {
        Err(StreamSQLError::ConfigError(format!(
            "invalid change table name '{}'",
            table
        )))
    }
}

/// DDL for the change table and its indexes. Every statement is idempotent.
/// Identifier and label columns are unbounded so an oversized record id
/// never rejects the row.
pub fn schema_statements(table: &str) -> StreamSQLResult<Vec<String>> {
    validate_table_name(table)?;
    let base = table.rsplit('.').next().unwrap_or(table);

    Ok(vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                source_database TEXT NOT NULL,
                source_table TEXT NOT NULL,
                source_server TEXT NOT NULL,
                topic_name TEXT NOT NULL,
                operation VARCHAR(10) NOT NULL,
                record_id TEXT,
                change_timestamp TIMESTAMPTZ NOT NULL DEFAULT now(),
                kafka_timestamp BIGINT,
                before_data TEXT,
                after_data TEXT,
                full_payload TEXT,
                processed_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
            table
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS ix_{base}_source_table_change_timestamp \
             ON {table} (source_table, change_timestamp)",
            base = base,
            table = table
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS ix_{base}_operation_change_timestamp \
             ON {table} (operation, change_timestamp)",
            base = base,
            table = table
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS ix_{base}_topic_name_change_timestamp \
             ON {table} (topic_name, change_timestamp)",
            base = base,
            table = table
        ),
    ])
}

pub fn insert_statement(table: &str) -> String {
    format!(
        "INSERT INTO {} (
            source_database, source_table, source_server, topic_name, operation,
            record_id, change_timestamp, kafka_timestamp, before_data, after_data,
            full_payload, processed_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        table
    )
}

pub struct PostgresChangeStore {
    pool: Pool,
    table: String,
    insert_sql: String,
}

impl PostgresChangeStore {
    /// Builds the pool without connecting; the first call opens a connection.
    pub fn new(config: &SinkConfig) -> StreamSQLResult<Self> {
        validate_table_name(&config.table)?;

        let manager_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let manager = Manager::from_config(config.pg_config(), NoTls, manager_config);
        let pool = Pool::builder(manager).max_size(config.pool_size).build()?;

        info!(
            "Change store: {}@{}:{}/{} table {}",
            config.user, config.host, config.port, config.database, config.table
        );
        Ok(PostgresChangeStore {
            pool,
            table: config.table.clone(),
            insert_sql: insert_statement(&config.table),
        })
    }
}

#[async_trait]
impl ChangeStore for PostgresChangeStore {
    async fn ensure_schema(&self) -> StreamSQLResult<()> {
        let client = self.pool.get().await?;
        for statement in schema_statements(&self.table)? {
            client.batch_execute(&statement).await?;
        }
        info!("Change table {} is ready", self.table);
        Ok(())
    }

    async fn append(&self, record: &ChangeRecord) -> StreamSQLResult<()> {
        let mut client = self.pool.get().await?;
        let transaction = client.transaction().await?;
        let statement = transaction.prepare_cached(&self.insert_sql).await?;
        let operation: &str = record.operation.as_ref();

        transaction
            .execute(
                &statement,
                &[
                    &record.source_database,
                    &record.source_table,
                    &record.source_server,
                    &record.topic_name,
                    &operation,
                    &record.record_id,
                    &record.change_timestamp,
                    &record.origin_ts_ms,
                    &record.before_data,
                    &record.after_data,
                    &record.full_payload,
                    &record.processed_at,
                ],
            )
            .await?;
        transaction.commit().await?;

        debug!(
            "Stored {} for {} (ID: {:?})",
            operation, record.source_table, record.record_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_table_name() {
        assert!(validate_table_name("cdc_changes").is_ok());
        assert!(validate_table_name("public.cdc_changes").is_ok());
        assert!(validate_table_name("public.cdc-changes").is_err());
        assert!(validate_table_name("a.b.c").is_err());
        assert!(validate_table_name("changes; DROP TABLE x").is_err());
        assert!(validate_table_name("").is_err());
    }

    #[test]
    fn test_schema_statements_are_idempotent() {
        let statements = schema_statements("public.cdc_changes").unwrap();
        assert_eq!(statements.len(), 4);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS public.cdc_changes"));
        for statement in &statements[1..] {
            assert!(statement.starts_with("CREATE INDEX IF NOT EXISTS ix_cdc_changes_"));
            assert!(statement.contains("ON public.cdc_changes"));
        }
        assert!(statements[1].contains("(source_table, change_timestamp)"));
        assert!(statements[2].contains("(operation, change_timestamp)"));
        assert!(statements[3].contains("(topic_name, change_timestamp)"));
    }

    #[test]
    fn test_schema_leaves_identifier_columns_unbounded() {
        let create = &schema_statements("cdc_changes").unwrap()[0];
        let columns = [
            "source_database",
            "source_table",
            "source_server",
            "topic_name",
            "record_id",
        ];
        for column in columns {
            let line = create
                .lines()
                .find(|line| line.trim_start().starts_with(column))
                .unwrap();
            assert!(line.contains("TEXT"), "{} is bounded: {}", column, line.trim());
        }
    }

    #[test]
    fn test_schema_statements_reject_bad_table() {
        assert!(matches!(
            schema_statements("x y"),
            Err(StreamSQLError::ConfigError(_))
        ));
    }

    #[test]
    fn test_insert_statement_has_one_placeholder_per_column() {
        let sql = insert_statement("public.cdc_changes");
        assert!(sql.starts_with("INSERT INTO public.cdc_changes"));
        assert!(sql.contains("$12)"));
        assert!(!sql.contains("$13"));
    }
}
