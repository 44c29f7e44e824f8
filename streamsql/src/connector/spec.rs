use crate::connector::config::ConnectorDefaults;
use crate::env::parse_number;
use crate::error::StreamSQLResult;
use crate::source::SourceConfig;
use serde::{Deserialize, Serialize};

/// Body of `POST /connectors`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ConnectorSpec {
    pub name: String,
    pub config: ConnectorSpecConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ConnectorSpecConfig {
    #[serde(rename = "connector.class")]
    pub connector_class: String,
    #[serde(rename = "database.hostname")]
    pub hostname: String,
    #[serde(rename = "database.port")]
    pub port: String,
    #[serde(rename = "database.user")]
    pub user: String,
    #[serde(rename = "database.password")]
    pub password: String,
    #[serde(rename = "database.dbname")]
    pub dbname: String,
    #[serde(rename = "database.server.name")]
    pub server_name: String,
    #[serde(rename = "table.include.list")]
    pub table_include_list: String,
    #[serde(rename = "database.history.kafka.bootstrap.servers")]
    pub history_bootstrap_servers: String,
    #[serde(rename = "database.history.kafka.topic")]
    pub history_topic: String,
    #[serde(rename = "database.history.kafka.recovery.poll.interval.ms")]
    pub history_recovery_poll_interval_ms: String,
    #[serde(rename = "database.history.kafka.recovery.attempts")]
    pub history_recovery_attempts: String,
    #[serde(rename = "tasks.max")]
    pub tasks_max: String,
    #[serde(rename = "snapshot.mode")]
    pub snapshot_mode: String,
    #[serde(rename = "topic.creation.default.replication.factor")]
    pub replication_factor: i32,
    #[serde(rename = "topic.creation.default.partitions")]
    pub partitions: i32,
    #[serde(rename = "topic.creation.enable")]
    pub topic_creation_enable: bool,
    #[serde(rename = "database.encrypt")]
    pub encrypt: String,
    #[serde(rename = "database.trustServerCertificate")]
    pub trust_server_certificate: String,
}

impl ConnectorSpec {
    /// Topic the capture job is expected to publish to.
    pub fn topic_name(&self) -> String {
        format!("{}.{}", self.config.server_name, self.config.table_include_list)
    }
}

/// Replaces separators and spaces so the table can be embedded in job,
/// alias and topic names.
pub fn sanitize_table_name(table: &str) -> String {
    table.replace(['.', ' '], "_")
}

pub fn connector_name(prefix: &str, source: &SourceConfig, table: &str) -> String {
    format!("{}-db{}-{}", prefix, source.index, sanitize_table_name(table))
}

pub fn server_alias(source: &SourceConfig, table: &str) -> String {
    format!("{}-{}", source.server_name, sanitize_table_name(table))
}

pub struct ConnectorSpecBuilder {
    defaults: ConnectorDefaults,
}

impl ConnectorSpecBuilder {
    pub fn new(defaults: ConnectorDefaults) -> Self {
        ConnectorSpecBuilder { defaults }
    }

    pub fn defaults(&self) -> &ConnectorDefaults {
        &self.defaults
    }

    pub fn build(&self, source: &SourceConfig, table: &str) -> StreamSQLResult<ConnectorSpec> {
        let overrides = &source.overrides;
        let table_safe = sanitize_table_name(table);

        let replication_factor = overrides
            .replication_factor
            .as_deref()
            .unwrap_or(self.defaults.replication_factor.as_str());
        let partitions = overrides
            .partitions
            .as_deref()
            .unwrap_or(self.defaults.partitions.as_str());

        let config = ConnectorSpecConfig {
            connector_class: self.defaults.connector_class.clone(),
            hostname: source.hostname.clone(),
            port: source.port.to_string(),
            user: source.user.clone(),
            password: source.password.clone(),
            dbname: source.database.clone(),
            server_name: server_alias(source, table),
            table_include_list: table.to_string(),
            history_bootstrap_servers: self.defaults.bootstrap_servers.clone(),
            history_topic: format!("{}-{}", source.history_topic, table_safe),
            history_recovery_poll_interval_ms: self.defaults.recovery_poll_interval_ms.clone(),
            history_recovery_attempts: self.defaults.recovery_attempts.clone(),
            tasks_max: overrides
                .tasks_max
                .clone()
                .unwrap_or_else(|| self.defaults.tasks_max.clone()),
            snapshot_mode: overrides
                .snapshot_mode
                .clone()
                .unwrap_or_else(|| self.defaults.snapshot_mode.clone()),
            replication_factor: parse_number(
                "TOPIC_CREATION_REPLICATION_FACTOR",
                replication_factor,
            )?,
            partitions: parse_number("TOPIC_CREATION_PARTITIONS", partitions)?,
            topic_creation_enable: self.defaults.topic_creation_enable,
            encrypt: "false".to_string(),
            trust_server_certificate: "true".to_string(),
        };

        Ok(ConnectorSpec {
            name: connector_name(&self.defaults.name_prefix, source, table),
            config,
        })
    }
}
