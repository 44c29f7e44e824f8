use crate::consumer::stream::{ConsumerFactory, InboundMessage, MessageStream};
use crate::error::{StreamSQLError, StreamSQLResult};
use crate::kafka::config::KafkaConfig;
use crate::kafka::discovery::TopicBinding;
use async_trait::async_trait;
use log::{debug, info};
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer, StreamConsumer};
use rdkafka::{Message, Offset, TopicPartitionList};

pub struct Kafka {
    pub config: KafkaConfig,
}

impl Kafka {
    pub fn new(config: &KafkaConfig) -> Self {
        Kafka {
            config: config.clone(),
        }
    }

    pub fn consumer_config(&self, group_id: &str) -> ClientConfig {
        let mut config = ClientConfig::new();
        config.set("group.id", group_id);
        config.set("bootstrap.servers", &self.config.bootstrap_servers);
        config.set("enable.auto.commit", "true");
        config.set("auto.offset.reset", "latest");
        config
    }

    /// Names of every topic currently known to the broker.
    pub async fn list_topics(&self) -> StreamSQLResult<Vec<String>> {
        let group_id = format!("{}-discovery", self.config.group_prefix);
        let consumer: BaseConsumer = self.consumer_config(&group_id).create()?;
        let timeout = self.config.metadata_timeout;

        let topics = tokio::task::spawn_blocking(move || -> StreamSQLResult<Vec<String>> {
            let metadata = consumer.fetch_metadata(None, timeout)?;
            Ok(metadata
                .topics()
                .iter()
                .map(|topic| topic.name().to_string())
                .collect())
        })
        .await??;

        debug!("Broker reports {} topics", topics.len());
        Ok(topics)
    }
}

#[async_trait]
impl ConsumerFactory for Kafka {
    /// Every partition of the topic is assigned at its end offset, so the
    /// reader only sees messages produced after it attached.
    async fn attach(&self, binding: &TopicBinding) -> StreamSQLResult<MessageStream> {
        let group_id = binding.consumer_group(&self.config.group_prefix);
        let consumer: StreamConsumer = self.consumer_config(&group_id).create()?;
        let topic = binding.topic.clone();
        let timeout = self.config.metadata_timeout;

        let consumer = tokio::task::spawn_blocking(move || -> StreamSQLResult<StreamConsumer> {
            let metadata = consumer.fetch_metadata(Some(topic.as_str()), timeout)?;
            let mut assignment = TopicPartitionList::new();
            for topic_metadata in metadata.topics() {
                if let Some(err) = topic_metadata.error() {
                    return Err(StreamSQLError::WorkerFatal(format!(
                        "metadata for {} failed: {:?}",
                        topic, err
                    )));
                }
                for partition in topic_metadata.partitions() {
                    assignment.add_partition_offset(
                        topic_metadata.name(),
                        partition.id(),
                        Offset::End,
                    )?;
                }
            }
            if assignment.count() == 0 {
                return Err(StreamSQLError::WorkerFatal(format!(
                    "topic {} has no partitions",
                    topic
                )));
            }
            consumer.assign(&assignment)?;
            Ok(consumer)
        })
        .await??;

        info!(
            "[{}] Attached to {} as group {}",
            binding.label(),
            binding.topic,
            group_id
        );

        let stream = futures::stream::unfold(consumer, |consumer| async move {
            let item = match consumer.recv().await {
                Ok(message) => Ok(InboundMessage {
                    payload: message.payload().map(<[u8]>::to_vec),
                    partition: message.partition(),
                    offset: message.offset(),
                }),
                Err(err) => Err(StreamSQLError::from(err)),
            };
            Some((item, consumer))
        });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumer_config() {
        let kafka = Kafka::new(&KafkaConfig::new(
            "localhost:9092".to_string(),
            "cdc-db-writer".to_string(),
        ));
        let config = kafka.consumer_config("cdc-db-writer-db1-dbo-Customers");

        assert_eq!(config.get("group.id"), Some("cdc-db-writer-db1-dbo-Customers"));
        assert_eq!(config.get("bootstrap.servers"), Some("localhost:9092"));
        assert_eq!(config.get("enable.auto.commit"), Some("true"));
        assert_eq!(config.get("auto.offset.reset"), Some("latest"));
    }
}
