use crate::env::{number_or, EnvSource};
use crate::error::{MissingValueError, StreamSQLResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CHANGES_TABLE: &str = "public.cdc_changes";

/// Connection settings for the change store.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SinkConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub table: String,
    /// The change writer appends sequentially and holds one connection at
    /// a time, so sizes above 1 only matter to other users of the store.
    pub pool_size: usize,
    pub statement_timeout: Duration,
}

impl SinkConfig {
    /// `TARGET_DB_*` variables, each falling back to the matching `DB1_*`
    /// variable. The port does not fall back.
    pub fn from_env(env: &dyn EnvSource) -> StreamSQLResult<Self> {
        let target = |field: &str| -> StreamSQLResult<String> {
            let key = format!("TARGET_DB_{}", field);
            env.var(&key)
                .or_else(|| env.var(&format!("DB1_{}", field)))
                .ok_or_else(|| MissingValueError::new(key).into())
        };

        Ok(SinkConfig {
            host: target("HOSTNAME")?,
            port: number_or(env, "TARGET_DB_PORT", 5432)?,
            user: target("USER")?,
            password: target("PASSWORD")?,
            database: target("NAME")?,
            table: env.var_or("CDC_CHANGES_TABLE", DEFAULT_CHANGES_TABLE),
            pool_size: number_or(env, "SINK_POOL_SIZE", 1)?,
            statement_timeout: Duration::from_millis(number_or(
                env,
                "SINK_STATEMENT_TIMEOUT_MS",
                30_000,
            )?),
        })
    }

    pub fn pg_config(&self) -> tokio_postgres::Config {
        let mut config = tokio_postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .user(&self.user)
            .password(&self.password)
            .dbname(&self.database)
            .application_name("streamsql")
            .options(&format!(
                "-c statement_timeout={}",
                self.statement_timeout.as_millis()
            ));
        config
    }
}
