use crate::env::{number_or, EnvSource};
use crate::error::StreamSQLResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_GROUP_PREFIX: &str = "cdc-db-writer";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct KafkaConfig {
    pub bootstrap_servers: String,
    pub group_prefix: String,
    pub metadata_timeout: Duration,
}

impl KafkaConfig {
    pub fn new(bootstrap_servers: String, group_prefix: String) -> Self {
        KafkaConfig {
            bootstrap_servers,
            group_prefix,
            metadata_timeout: Duration::from_secs(10),
        }
    }

    pub fn from_env(env: &dyn EnvSource) -> StreamSQLResult<Self> {
        let mut config = KafkaConfig::new(
            env.var_or("KAFKA_BOOTSTRAP_SERVERS", "kafka:29092"),
            env.var_or("CONSUMER_GROUP_PREFIX", DEFAULT_GROUP_PREFIX),
        );
        config.metadata_timeout = Duration::from_secs(number_or(
            env,
            "KAFKA_METADATA_TIMEOUT_SECS",
            config.metadata_timeout.as_secs(),
        )?);
        Ok(config)
    }
}
