use serde::{Deserialize, Serialize};

/// Per-source overrides for the global connector tunables.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct TunableOverrides {
    pub tasks_max: Option<String>,
    pub snapshot_mode: Option<String>,
    pub replication_factor: Option<String>,
    pub partitions: Option<String>,
}

/// One monitored database, read from the `DB{n}_*` variables.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub index: u32,
    pub hostname: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub server_name: String,
    pub tables: Vec<String>,
    pub history_topic: String,
    pub overrides: TunableOverrides,
}

impl SourceConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: u32,
        hostname: String,
        port: u16,
        user: String,
        password: String,
        database: String,
        server_name: String,
        tables: Vec<String>,
    ) -> Self {
        SourceConfig {
            index,
            hostname,
            port,
            user,
            password,
            database,
            server_name,
            tables,
            history_topic: default_history_topic(index),
            overrides: TunableOverrides::default(),
        }
    }

    /// Stable identifier used in logs, consumer groups and the persisted label.
    pub fn source_id(&self) -> String {
        format!("DB{}", self.index)
    }
}

pub fn default_history_topic(index: u32) -> String {
    format!("dbhistory.sql-server-cdc-db{}", index)
}
