use crate::consumer::config::ConsumerConfig;
use crate::consumer::stream::ConsumerFactory;
use crate::consumer::worker::{TopicWorker, WorkerExit, WorkerReport, WorkerStats};
use crate::event::{ChangeRecord, Normalizer};
use crate::kafka::discovery::TopicBinding;
use log::{info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};

/// Registry of running topic workers, keyed by topic name.
///
/// A worker that dies stays registered, so later discovery passes do not
/// restart it.
pub struct ConsumerPool {
    factory: Arc<dyn ConsumerFactory>,
    normalizer: Arc<Normalizer>,
    sink: mpsc::Sender<ChangeRecord>,
    shutdown_tx: watch::Sender<bool>,
    config: ConsumerConfig,
    workers: HashMap<String, JoinHandle<WorkerReport>>,
}

impl ConsumerPool {
    pub fn new(
        factory: Arc<dyn ConsumerFactory>,
        normalizer: Arc<Normalizer>,
        sink: mpsc::Sender<ChangeRecord>,
        config: ConsumerConfig,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        ConsumerPool {
            factory,
            normalizer,
            sink,
            shutdown_tx,
            config,
            workers: HashMap::new(),
        }
    }

    /// Starts a worker for every binding whose topic is not registered yet.
    /// Returns how many were started.
    pub fn spawn_bindings(&mut self, bindings: Vec<TopicBinding>) -> usize {
        let mut spawned = 0;
        for binding in bindings {
            if self.workers.contains_key(&binding.topic) {
                continue;
            }

            let topic = binding.topic.clone();
            let worker = TopicWorker::new(
                binding,
                self.factory.clone(),
                self.normalizer.clone(),
                self.sink.clone(),
                self.shutdown_tx.subscribe(),
                self.config.max_consecutive_failures,
            );
            self.workers.insert(topic, tokio::spawn(worker.run()));
            spawned += 1;
        }

        if spawned > 0 {
            info!(
                "Started {} consumer worker(s), {} registered",
                spawned,
                self.workers.len()
            );
        }
        spawned
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.workers.contains_key(topic)
    }

    /// Workers whose loop has already ended.
    pub fn finished(&self) -> usize {
        self.workers.values().filter(|h| h.is_finished()).count()
    }

    /// Signals every worker to stop and waits up to the configured grace
    /// period. Workers still running after that are aborted.
    pub async fn shutdown(self) -> Vec<WorkerReport> {
        let ConsumerPool {
            shutdown_tx,
            sink,
            config,
            workers,
            ..
        } = self;

        info!("Stopping {} consumer worker(s)", workers.len());
        shutdown_tx.send_replace(true);
        drop(sink);

        let deadline = Instant::now() + config.shutdown_grace;
        let mut reports = Vec::with_capacity(workers.len());
        for (topic, mut handle) in workers {
            match timeout_at(deadline, &mut handle).await {
                Ok(Ok(report)) => reports.push(report),
                Ok(Err(err)) => warn!("Worker for {} panicked: {}", topic, err),
                Err(_) => {
                    warn!("Worker for {} did not stop in time, aborting", topic);
                    handle.abort();
                }
            }
        }

        let total = reports.iter().fold(WorkerStats::default(), |mut acc, r| {
            acc.received += r.stats.received;
            acc.forwarded += r.stats.forwarded;
            acc.snapshots_skipped += r.stats.snapshots_skipped;
            acc.tombstones += r.stats.tombstones;
            acc.rejected += r.stats.rejected;
            acc
        });
        let failed = reports
            .iter()
            .filter(|r| !matches!(r.exit, WorkerExit::Shutdown | WorkerExit::StreamEnded))
            .count();
        info!(
            "Consumer pool stopped: {} worker(s), {} failed, {:?}",
            reports.len(),
            failed,
            total
        );
        reports
    }
}
