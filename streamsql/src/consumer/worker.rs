use crate::consumer::stream::{ConsumerFactory, InboundMessage};
use crate::error::StreamSQLResult;
use crate::event::{ChangeRecord, Normalizer, RawEnvelope};
use crate::kafka::discovery::TopicBinding;
use futures::StreamExt;
use log::{debug, error, info, warn};
use std::fmt::{self, Display};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

#[derive(Debug, Clone, PartialEq)]
pub enum WorkerExit {
    Shutdown,
    StreamEnded,
    WriterClosed,
    AttachFailed(String),
    Fatal(String),
}

impl Display for WorkerExit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            WorkerExit::Shutdown => write!(f, "shutdown requested"),
            WorkerExit::StreamEnded => write!(f, "stream ended"),
            WorkerExit::WriterClosed => write!(f, "writer closed"),
            WorkerExit::AttachFailed(reason) => write!(f, "attach failed: {}", reason),
            WorkerExit::Fatal(reason) => write!(f, "fatal: {}", reason),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct WorkerStats {
    pub received: u64,
    pub forwarded: u64,
    pub snapshots_skipped: u64,
    pub tombstones: u64,
    pub rejected: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerReport {
    pub binding: TopicBinding,
    pub exit: WorkerExit,
    pub stats: WorkerStats,
}

enum Step {
    Forward(ChangeRecord),
    Skip,
    Reject,
}

/// Consumption loop for a single topic.
///
/// Bad messages are logged and skipped. The loop only ends on shutdown, when
/// the stream or the writer goes away, or after `max_consecutive_failures`
/// failed messages in a row.
pub struct TopicWorker {
    binding: TopicBinding,
    label: String,
    factory: Arc<dyn ConsumerFactory>,
    normalizer: Arc<Normalizer>,
    sink: mpsc::Sender<ChangeRecord>,
    shutdown: watch::Receiver<bool>,
    max_consecutive_failures: u32,
    stats: WorkerStats,
}

impl TopicWorker {
    pub fn new(
        binding: TopicBinding,
        factory: Arc<dyn ConsumerFactory>,
        normalizer: Arc<Normalizer>,
        sink: mpsc::Sender<ChangeRecord>,
        shutdown: watch::Receiver<bool>,
        max_consecutive_failures: u32,
    ) -> Self {
        TopicWorker {
            label: binding.label(),
            binding,
            factory,
            normalizer,
            sink,
            shutdown,
            max_consecutive_failures,
            stats: WorkerStats::default(),
        }
    }

    pub async fn run(mut self) -> WorkerReport {
        let exit = self.consume().await;
        match &exit {
            WorkerExit::Shutdown | WorkerExit::StreamEnded => info!(
                "[{}] Worker stopped ({}): {:?}",
                self.label, exit, self.stats
            ),
            _ => error!(
                "[{}] Worker exited ({}): {:?}",
                self.label, exit, self.stats
            ),
        }

        WorkerReport {
            binding: self.binding,
            exit,
            stats: self.stats,
        }
    }

    async fn consume(&mut self) -> WorkerExit {
        if *self.shutdown.borrow() {
            return WorkerExit::Shutdown;
        }

        info!("[{}] Connecting to topic {}", self.label, self.binding.topic);
        let attached = tokio::select! {
            attached = self.factory.attach(&self.binding) => attached,
            _ = self.shutdown.changed() => return WorkerExit::Shutdown,
        };
        let mut stream = match attached {
            Ok(stream) => stream,
            Err(err) => return WorkerExit::AttachFailed(err.to_string()),
        };

        let mut consecutive_failures = 0u32;
        loop {
            let next = tokio::select! {
                biased;
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        return WorkerExit::Shutdown;
                    }
                    continue;
                }
                next = stream.next() => next,
            };

            let step = match next {
                None => return WorkerExit::StreamEnded,
                Some(message) => self.process(message),
            };

            match step {
                Step::Forward(record) => {
                    consecutive_failures = 0;
                    if self.sink.send(record).await.is_err() {
                        return WorkerExit::WriterClosed;
                    }
                    self.stats.forwarded += 1;
                }
                Step::Skip => consecutive_failures = 0,
                Step::Reject => {
                    self.stats.rejected += 1;
                    consecutive_failures += 1;
                    if consecutive_failures >= self.max_consecutive_failures {
                        return WorkerExit::Fatal(format!(
                            "{} consecutive failed messages",
                            consecutive_failures
                        ));
                    }
                }
            }
        }
    }

    fn process(&mut self, message: StreamSQLResult<InboundMessage>) -> Step {
        let message = match message {
            Ok(message) => message,
            Err(err) => {
                warn!("[{}] Broker error: {}", self.label, err);
                return Step::Reject;
            }
        };
        self.stats.received += 1;

        let payload = match &message.payload {
            Some(payload) => payload,
            None => {
                debug!(
                    "[{}] Skipping tombstone at {}:{}",
                    self.label, message.partition, message.offset
                );
                self.stats.tombstones += 1;
                return Step::Skip;
            }
        };

        let envelope = match RawEnvelope::decode(payload) {
            Ok(envelope) => envelope,
            Err(err) => {
                error!(
                    "[{}] Message at {}:{}: {}",
                    self.label, message.partition, message.offset, err
                );
                return Step::Reject;
            }
        };

        let record = match self.normalizer.normalize(&envelope, &self.binding) {
            Ok(record) => record,
            Err(err) => {
                error!(
                    "[{}] Message at {}:{}: {}",
                    self.label, message.partition, message.offset, err
                );
                return Step::Reject;
            }
        };

        if record.operation.is_snapshot() {
            debug!(
                "[{}] Skipping snapshot record {:?}",
                self.label, record.record_id
            );
            self.stats.snapshots_skipped += 1;
            return Step::Skip;
        }

        info!(
            "[{}] {} on {} (ID: {})",
            self.label,
            record.operation,
            record.source_table,
            record.record_id.as_deref().unwrap_or("-")
        );
        Step::Forward(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::stream::{MessageStream, MockConsumerFactory};
    use crate::error::StreamSQLError;
    use crate::event::OperationKind;
    use futures::stream;
    use serde_json::json;

    fn binding() -> TopicBinding {
        TopicBinding {
            topic: "srv1-dbo_Customers.dbo.Customers".to_string(),
            source_id: "DB1".to_string(),
            server_name: "srv1".to_string(),
            database: "TestCDC".to_string(),
            table: "dbo.Customers".to_string(),
        }
    }

    fn envelope(op: &str, id: i64) -> InboundMessage {
        let body = json!({"op": op, "after": {"CustomerID": id}, "ts_ms": 1});
        InboundMessage::new(body.to_string(), 0, id)
    }

    fn factory_with(messages: Vec<StreamSQLResult<InboundMessage>>) -> Arc<dyn ConsumerFactory> {
        let mut factory = MockConsumerFactory::new();
        let mut messages = Some(messages);
        factory.expect_attach().times(1).returning(move |_| {
            let stream: MessageStream = Box::pin(stream::iter(messages.take().unwrap_or_default()));
            Ok(stream)
        });
        Arc::new(factory)
    }

    fn worker(
        factory: Arc<dyn ConsumerFactory>,
        max_failures: u32,
    ) -> (
        TopicWorker,
        mpsc::Receiver<ChangeRecord>,
        watch::Sender<bool>,
    ) {
        let (tx, rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let worker = TopicWorker::new(
            binding(),
            factory,
            Arc::new(Normalizer::default()),
            tx,
            shutdown_rx,
            max_failures,
        );
        (worker, rx, shutdown_tx)
    }

    fn drain(rx: &mut mpsc::Receiver<ChangeRecord>) -> Vec<ChangeRecord> {
        let mut records = vec![];
        while let Ok(record) = rx.try_recv() {
            records.push(record);
        }
        records
    }

    #[tokio::test]
    async fn test_bad_message_does_not_stop_worker() {
        let factory = factory_with(vec![
            Ok(InboundMessage::new("{not json", 0, 0)),
            Ok(envelope("u", 7)),
        ]);
        let (worker, mut rx, _shutdown) = worker(factory, 10);

        let report = worker.run().await;
        let records = drain(&mut rx);

        assert_eq!(report.exit, WorkerExit::StreamEnded);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].operation, OperationKind::Update);
        assert_eq!(records[0].record_id.as_deref(), Some("7"));
        assert_eq!(report.stats.received, 2);
        assert_eq!(report.stats.rejected, 1);
        assert_eq!(report.stats.forwarded, 1);
    }

    #[tokio::test]
    async fn test_snapshots_and_tombstones_are_not_forwarded() {
        let factory = factory_with(vec![
            Ok(envelope("r", 1)),
            Ok(InboundMessage::tombstone(0, 2)),
            Ok(envelope("c", 3)),
            Ok(envelope("d", 3)),
        ]);
        let (worker, mut rx, _shutdown) = worker(factory, 10);

        let report = worker.run().await;
        let operations: Vec<OperationKind> =
            drain(&mut rx).into_iter().map(|r| r.operation).collect();

        assert_eq!(operations, vec![OperationKind::Create, OperationKind::Delete]);
        assert_eq!(report.stats.snapshots_skipped, 1);
        assert_eq!(report.stats.tombstones, 1);
    }

    #[tokio::test]
    async fn test_failure_storm_is_fatal() {
        let factory = factory_with(vec![
            Ok(InboundMessage::new("[1]", 0, 0)),
            Err(StreamSQLError::WorkerFatal("broker down".into())),
            Ok(InboundMessage::new("oops", 0, 1)),
            Ok(envelope("c", 4)),
        ]);
        let (worker, mut rx, _shutdown) = worker(factory, 3);

        let report = worker.run().await;
        assert!(matches!(report.exit, WorkerExit::Fatal(_)));
        assert!(drain(&mut rx).is_empty());
        assert_eq!(report.stats.rejected, 3);
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let factory = factory_with(vec![
            Ok(InboundMessage::new("bad", 0, 0)),
            Ok(envelope("c", 1)),
            Ok(InboundMessage::new("bad", 0, 2)),
            Ok(envelope("u", 1)),
        ]);
        let (worker, mut rx, _shutdown) = worker(factory, 2);

        let report = worker.run().await;
        assert_eq!(report.exit, WorkerExit::StreamEnded);
        assert_eq!(drain(&mut rx).len(), 2);
    }

    #[tokio::test]
    async fn test_attach_failure_is_reported() {
        let mut factory = MockConsumerFactory::new();
        factory
            .expect_attach()
            .returning(|_| Err(StreamSQLError::WorkerFatal("no partitions".into())));
        let (worker, _rx, _shutdown) = worker(Arc::new(factory), 10);

        let report = worker.run().await;
        assert!(matches!(report.exit, WorkerExit::AttachFailed(_)));
    }

    #[tokio::test]
    async fn test_shutdown_stops_idle_worker() {
        let mut factory = MockConsumerFactory::new();
        factory.expect_attach().returning(|_| {
            let stream: MessageStream =
                Box::pin(stream::pending::<StreamSQLResult<InboundMessage>>());
            Ok(stream)
        });
        let (worker, _rx, shutdown) = worker(Arc::new(factory), 10);

        let handle = tokio::spawn(worker.run());
        shutdown.send(true).unwrap();

        let report = handle.await.unwrap();
        assert_eq!(report.exit, WorkerExit::Shutdown);
    }

    #[tokio::test]
    async fn test_closed_writer_stops_worker() {
        let factory = factory_with(vec![Ok(envelope("c", 1))]);
        let (worker, rx, _shutdown) = worker(factory, 10);
        drop(rx);

        let report = worker.run().await;
        assert_eq!(report.exit, WorkerExit::WriterClosed);
    }
}
