use crate::args::Args;
use streamsql::connector::{ConnectorDefaults, ControlPlaneConfig};
use streamsql::consumer::ConsumerConfig;
use streamsql::env::EnvSource;
use streamsql::error::StreamSQLResult;
use streamsql::event::NormalizerConfig;
use streamsql::kafka::KafkaConfig;
use streamsql::sink::SinkConfig;
use streamsql::source::SourceRegistry;

#[derive(Debug)]
pub struct AppConfig {
    pub registry: SourceRegistry,
    pub connector_defaults: ConnectorDefaults,
    pub control_plane: ControlPlaneConfig,
    pub kafka: KafkaConfig,
    pub normalizer: NormalizerConfig,
    pub consumer: ConsumerConfig,
    /// Only read when the consumers run.
    pub sink: Option<SinkConfig>,
}

impl AppConfig {
    pub fn load(env: &dyn EnvSource, args: &Args) -> StreamSQLResult<Self> {
        let registry = SourceRegistry::load(env)?;
        let mut kafka = KafkaConfig::from_env(env)?;
        args.apply_to_kafka_config(&mut kafka);

        let sink = if args.skip_consume {
            None
        } else {
            Some(SinkConfig::from_env(env)?)
        };

        Ok(AppConfig {
            registry,
            connector_defaults: ConnectorDefaults::from_env(env),
            control_plane: ControlPlaneConfig::from_env(env)?,
            kafka,
            normalizer: NormalizerConfig::from_env(env),
            consumer: ConsumerConfig::from_env(env)?,
            sink,
        })
    }
}
