use futures::StreamExt;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::ClientConfig;
use std::time::Duration;
use streamsql::consumer::ConsumerFactory;
use streamsql::kafka::{Kafka, KafkaConfig, TopicBinding};

const BOOTSTRAP_SERVERS: &str = "localhost:9092";

fn unique_topic(table: &str) -> String {
    format!(
        "srvtest{}-{}.{}",
        chrono::Utc::now().timestamp_millis(),
        table.replace('.', "_"),
        table
    )
}

async fn create_topic(topic: &str) {
    let mut config = ClientConfig::new();
    config.set("bootstrap.servers", BOOTSTRAP_SERVERS);
    let admin: AdminClient<DefaultClientContext> = config.create().unwrap();
    let topics = [NewTopic::new(topic, 1, TopicReplication::Fixed(1))];
    admin
        .create_topics(&topics, &AdminOptions::new())
        .await
        .unwrap();
}

fn binding(topic: &str) -> TopicBinding {
    TopicBinding {
        topic: topic.to_string(),
        source_id: "DB1".to_string(),
        server_name: topic.split('-').next().unwrap().to_string(),
        database: "TestCDC".to_string(),
        table: "dbo.Customers".to_string(),
    }
}

#[tokio::test]
#[ignore = "needs a broker on localhost:9092"]
async fn test_kafka_list_topics() {
    let topic = unique_topic("dbo.Customers");
    create_topic(&topic).await;

    let kafka = Kafka::new(&KafkaConfig::new(
        BOOTSTRAP_SERVERS.to_string(),
        "streamsql-test".to_string(),
    ));
    let topics = kafka.list_topics().await.unwrap();
    assert!(topics.contains(&topic));
}

#[tokio::test]
#[ignore = "needs a broker on localhost:9092"]
async fn test_kafka_attach_reads_new_messages() {
    let topic = unique_topic("dbo.Customers");
    create_topic(&topic).await;

    let mut config = ClientConfig::new();
    config.set("bootstrap.servers", BOOTSTRAP_SERVERS);
    let producer: FutureProducer = config.create().unwrap();
    producer
        .send(
            FutureRecord::to(&topic).key("old").payload("{\"op\":\"c\"}"),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    let kafka = Kafka::new(&KafkaConfig::new(
        BOOTSTRAP_SERVERS.to_string(),
        "streamsql-test".to_string(),
    ));
    let mut stream = kafka.attach(&binding(&topic)).await.unwrap();
    let first = tokio::time::timeout(Duration::from_secs(2), stream.next()).await;
    assert!(first.is_err(), "messages produced before attaching must not be read");

    producer
        .send(
            FutureRecord::to(&topic).key("new").payload("{\"op\":\"u\"}"),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    let message = tokio::time::timeout(Duration::from_secs(10), stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(message.payload.as_deref(), Some("{\"op\":\"u\"}".as_bytes()));
}
