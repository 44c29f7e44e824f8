use crate::state::AppState;
use anyhow::Context;
use log::{error, info, warn};
use std::future::Future;
use std::sync::Arc;
use streamsql::connector::{ConnectorProvisioner, ConnectorSpecBuilder, KafkaConnectClient};
use streamsql::consumer::{ConsumerFactory, ConsumerPool};
use streamsql::event::Normalizer;
use streamsql::kafka::discover;
use streamsql::sink::{ChangeStoreWriter, PostgresChangeStore};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval};

/// Creates or replaces one capture connector per configured table. Only an
/// unreachable control plane is an error.
pub async fn provision(state: &AppState) -> anyhow::Result<()> {
    let config = &state.app_config;
    let client = KafkaConnectClient::new(&config.control_plane)?;
    let provisioner = ConnectorProvisioner::new(client, config.control_plane.clone());
    let builder = ConnectorSpecBuilder::new(config.connector_defaults.clone());

    let summary = provisioner
        .provision_all(&config.registry, &builder)
        .await
        .context("provisioning aborted")?;
    for failure in &summary.failures {
        warn!("{}", failure);
    }
    Ok(())
}

/// Runs the consumer pool and the change writer until interrupted.
pub async fn consume(state: &AppState) -> anyhow::Result<()> {
    let config = &state.app_config;
    let sink_config = config
        .sink
        .as_ref()
        .context("sink configuration was not loaded")?;

    let writer = Arc::new(ChangeStoreWriter::new(PostgresChangeStore::new(sink_config)?));
    writer.ensure_schema().await;

    let (tx, rx) = mpsc::channel(config.consumer.channel_capacity.max(1));
    let writer_task = {
        let writer = writer.clone();
        tokio::spawn(async move { writer.run(rx).await })
    };

    let factory: Arc<dyn ConsumerFactory> = state.kafka.clone();
    let mut pool = ConsumerPool::new(
        factory,
        Arc::new(Normalizer::new(config.normalizer.clone())),
        tx,
        config.consumer.clone(),
    );

    discover_into(state, &mut pool).await;
    if pool.is_empty() {
        warn!("No CDC topics found yet");
    }

    let mut rediscovery = config
        .consumer
        .rediscovery_interval
        .map(|period| interval_at(Instant::now() + period, period));

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        match next_wake(&mut interrupt, &mut rediscovery).await {
            Wake::Interrupt(signal) => {
                if let Err(err) = signal {
                    error!("Failed to listen for the interrupt signal: {}", err);
                }
                info!("Interrupt received, shutting down");
                break;
            }
            Wake::Rediscover => discover_into(state, &mut pool).await,
        }
    }

    pool.shutdown().await;
    match tokio::time::timeout(config.consumer.shutdown_grace, writer_task).await {
        Ok(joined) => {
            joined?;
        }
        Err(_) => warn!("Change writer did not drain in time"),
    }
    Ok(())
}

/// Lists broker topics and starts workers for bindings the pool does not have.
async fn discover_into(state: &AppState, pool: &mut ConsumerPool) {
    let topics = match state.kafka.list_topics().await {
        Ok(topics) => topics,
        Err(err) => {
            error!("Topic discovery failed: {}", err);
            return;
        }
    };

    let bindings = discover(&topics, state.app_config.registry.sources());
    let started = pool.spawn_bindings(bindings);
    info!(
        "Discovery: {} topics on the broker, {} new worker(s), {} total",
        topics.len(),
        started,
        pool.len()
    );
}

#[derive(Debug)]
enum Wake<T> {
    Interrupt(T),
    Rediscover,
}

/// Waits for the interrupt or the next rediscovery tick, interrupt first.
/// `interrupt` is polled by reference so a signal raised while a
/// rediscovery pass runs is seen on the next call.
async fn next_wake<S>(interrupt: &mut S, rediscovery: &mut Option<Interval>) -> Wake<S::Output>
where
    S: Future + Unpin,
{
    tokio::select! {
        biased;
        signal = interrupt => Wake::Interrupt(signal),
        _ = next_tick(rediscovery) => Wake::Rediscover,
    }
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => futures::future::pending::<()>().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_rediscovery_is_not_lost() {
        let period = Duration::from_secs(10);
        let mut rediscovery = Some(interval_at(Instant::now() + period, period));
        let (tx, mut interrupt) = oneshot::channel::<()>();

        let first = next_wake(&mut interrupt, &mut rediscovery).await;
        assert!(matches!(first, Wake::Rediscover));

        // Raised while the rediscovery pass is running; the next tick is due too.
        tx.send(()).unwrap();
        tokio::time::advance(period).await;

        let second = next_wake(&mut interrupt, &mut rediscovery).await;
        assert!(matches!(second, Wake::Interrupt(Ok(()))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_rediscovery_waits_for_interrupt() {
        let mut rediscovery = None;
        let (tx, mut interrupt) = oneshot::channel::<()>();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            let _ = tx.send(());
        });

        let wake = next_wake(&mut interrupt, &mut rediscovery).await;
        assert!(matches!(wake, Wake::Interrupt(Ok(()))));
    }
}
