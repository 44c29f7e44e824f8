use crate::env::{number_or, EnvSource};
use crate::error::StreamSQLResult;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerConfig {
    /// A worker gives up after this many failed messages in a row.
    pub max_consecutive_failures: u32,
    /// `None` runs discovery once at startup.
    pub rediscovery_interval: Option<Duration>,
    pub shutdown_grace: Duration,
    /// Capacity of the channel between the workers and the writer.
    pub channel_capacity: usize,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        ConsumerConfig {
            max_consecutive_failures: 100,
            rediscovery_interval: None,
            shutdown_grace: Duration::from_secs(10),
            channel_capacity: 1024,
        }
    }
}

impl ConsumerConfig {
    pub fn from_env(env: &dyn EnvSource) -> StreamSQLResult<Self> {
        let defaults = ConsumerConfig::default();
        let rediscovery_interval = match env.var("REDISCOVERY_INTERVAL_SECS") {
            Some(_) => {
                let secs: u64 = number_or(env, "REDISCOVERY_INTERVAL_SECS", 0)?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(ConsumerConfig {
            max_consecutive_failures: number_or(
                env,
                "MAX_CONSECUTIVE_FAILURES",
                defaults.max_consecutive_failures,
            )?,
            rediscovery_interval,
            shutdown_grace: Duration::from_secs(number_or(
                env,
                "SHUTDOWN_GRACE_SECS",
                defaults.shutdown_grace.as_secs(),
            )?),
            channel_capacity: number_or(env, "CHANNEL_CAPACITY", defaults.channel_capacity)?,
        })
    }
}
