pub mod config;
pub mod pool;
pub mod stream;
pub mod worker;

pub use config::ConsumerConfig;
pub use pool::ConsumerPool;
pub use stream::{ConsumerFactory, InboundMessage, MessageStream};
pub use worker::{TopicWorker, WorkerExit, WorkerReport, WorkerStats};
