use crate::env::{flag_or, number_or, EnvSource};
use crate::error::StreamSQLResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CONNECTOR_CLASS: &str = "io.debezium.connector.sqlserver.SqlServerConnector";
pub const DEFAULT_CONNECTOR_PREFIX: &str = "mssql-source-connector";

/// Global connector tunables. Numeric tunables are kept as raw strings and
/// only parsed when a spec is built, so a bad value fails the affected jobs
/// rather than the whole process.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ConnectorDefaults {
    pub connector_class: String,
    pub name_prefix: String,
    pub bootstrap_servers: String,
    pub tasks_max: String,
    pub snapshot_mode: String,
    pub replication_factor: String,
    pub partitions: String,
    pub topic_creation_enable: bool,
    pub recovery_poll_interval_ms: String,
    pub recovery_attempts: String,
}

impl Default for ConnectorDefaults {
    fn default() -> Self {
        ConnectorDefaults {
            connector_class: DEFAULT_CONNECTOR_CLASS.to_string(),
            name_prefix: DEFAULT_CONNECTOR_PREFIX.to_string(),
            bootstrap_servers: "kafka:29092".to_string(),
            tasks_max: "1".to_string(),
            snapshot_mode: "initial".to_string(),
            replication_factor: "1".to_string(),
            partitions: "1".to_string(),
            topic_creation_enable: true,
            recovery_poll_interval_ms: "5000".to_string(),
            recovery_attempts: "4".to_string(),
        }
    }
}

impl ConnectorDefaults {
    pub fn from_env(env: &dyn EnvSource) -> Self {
        let defaults = ConnectorDefaults::default();
        ConnectorDefaults {
            connector_class: env.var_or("CONNECTOR_CLASS", &defaults.connector_class),
            name_prefix: env.var_or("CONNECTOR_NAME_PREFIX", &defaults.name_prefix),
            bootstrap_servers: env.var_or("KAFKA_BOOTSTRAP_SERVERS", &defaults.bootstrap_servers),
            tasks_max: env.var_or("TASKS_MAX", &defaults.tasks_max),
            snapshot_mode: env.var_or("SNAPSHOT_MODE", &defaults.snapshot_mode),
            replication_factor: env.var_or(
                "TOPIC_CREATION_REPLICATION_FACTOR",
                &defaults.replication_factor,
            ),
            partitions: env.var_or("TOPIC_CREATION_PARTITIONS", &defaults.partitions),
            topic_creation_enable: flag_or(
                env,
                "TOPIC_CREATION_ENABLE",
                defaults.topic_creation_enable,
            ),
            recovery_poll_interval_ms: env.var_or(
                "RECOVERY_POLL_INTERVAL_MS",
                &defaults.recovery_poll_interval_ms,
            ),
            recovery_attempts: env.var_or("RECOVERY_ATTEMPTS", &defaults.recovery_attempts),
        }
    }
}

/// Where the capture-connector runtime lives and how patiently to talk to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPlaneConfig {
    pub url: String,
    pub max_retries: u32,
    pub retry_interval: Duration,
    pub probe_timeout: Duration,
    pub request_timeout: Duration,
    pub create_timeout: Duration,
    /// Pause between deleting a stale job and recreating it.
    pub settle_interval: Duration,
    /// Pause between two consecutive job creations.
    pub creation_delay: Duration,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        ControlPlaneConfig {
            url: "http://kafka-connect:8083".to_string(),
            max_retries: 30,
            retry_interval: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
            create_timeout: Duration::from_secs(30),
            settle_interval: Duration::from_secs(5),
            creation_delay: Duration::from_secs(2),
        }
    }
}

impl ControlPlaneConfig {
    pub fn from_env(env: &dyn EnvSource) -> StreamSQLResult<Self> {
        let defaults = ControlPlaneConfig::default();
        Ok(ControlPlaneConfig {
            url: env
                .var_or("KAFKA_CONNECT_URL", &defaults.url)
                .trim_end_matches('/')
                .to_string(),
            max_retries: number_or(env, "CONNECT_MAX_RETRIES", defaults.max_retries)?,
            retry_interval: Duration::from_secs(number_or(
                env,
                "CONNECT_RETRY_INTERVAL_SECS",
                defaults.retry_interval.as_secs(),
            )?),
            ..defaults
        })
    }
}
