pub mod config;
pub mod discovery;
pub mod kafka_client;

pub use config::KafkaConfig;
pub use discovery::{discover, is_internal_topic, TopicBinding};
pub use kafka_client::Kafka;
