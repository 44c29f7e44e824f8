use crate::error::StreamSQLResult;
use crate::kafka::discovery::TopicBinding;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// One message as read off the broker, detached from the client's buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// `None` for tombstones.
    pub payload: Option<Vec<u8>>,
    pub partition: i32,
    pub offset: i64,
}

impl InboundMessage {
    pub fn new<P>(payload: P, partition: i32, offset: i64) -> Self
    where
        P: Into<Vec<u8>>,
    {
        InboundMessage {
            payload: Some(payload.into()),
            partition,
            offset,
        }
    }

    pub fn tombstone(partition: i32, offset: i64) -> Self {
        InboundMessage {
            payload: None,
            partition,
            offset,
        }
    }
}

/// Endless stream of messages for one topic. An `Err` item is a broker-side
/// failure; the stream itself keeps going until dropped.
pub type MessageStream = BoxStream<'static, StreamSQLResult<InboundMessage>>;

/// Attaches a reader to the topic of a binding.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConsumerFactory: Send + Sync {
    async fn attach(&self, binding: &TopicBinding) -> StreamSQLResult<MessageStream>;
}
