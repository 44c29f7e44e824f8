use crate::connector::config::ControlPlaneConfig;
use crate::connector::control_plane::ControlPlane;
use crate::connector::spec::{ConnectorSpec, ConnectorSpecBuilder};
use crate::error::{StreamSQLError, StreamSQLResult};
use crate::source::SourceRegistry;
use log::{error, info, warn};
use tokio::time::sleep;

#[derive(Debug, Default)]
pub struct ProvisionSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<StreamSQLError>,
}

impl ProvisionSummary {
    pub fn failed(&self) -> usize {
        self.attempted - self.succeeded
    }
}

/// Creates or replaces capture jobs on the control plane, one per
/// (source, table) pair.
pub struct ConnectorProvisioner<C: ControlPlane> {
    control_plane: C,
    config: ControlPlaneConfig,
}

impl<C: ControlPlane> ConnectorProvisioner<C> {
    pub fn new(control_plane: C, config: ControlPlaneConfig) -> Self {
        ConnectorProvisioner {
            control_plane,
            config,
        }
    }

    /// Polls the liveness endpoint. `false` means the control plane never
    /// answered within the retry budget and provisioning must be aborted.
    pub async fn ensure_capacity(&self) -> bool {
        info!("Waiting for the control plane at {}", self.config.url);

        for attempt in 1..=self.config.max_retries {
            match self.control_plane.get_root().await {
                Ok(reply) if reply.status == 200 => {
                    info!("Control plane is available");
                    return true;
                }
                Ok(reply) => warn!(
                    "Attempt {}/{}: control plane answered HTTP {}",
                    attempt, self.config.max_retries, reply.status
                ),
                Err(err) => warn!(
                    "Attempt {}/{}: control plane not reachable: {}",
                    attempt, self.config.max_retries, err
                ),
            }
            if attempt < self.config.max_retries {
                sleep(self.config.retry_interval).await;
            }
        }

        error!("Control plane failed to become available");
        false
    }

    /// Delete-then-create upsert. A 409 on create means another writer won
    /// the race and the job exists, which is the desired end state.
    pub async fn create_or_replace(&self, spec: &ConnectorSpec) -> StreamSQLResult<()> {
        let name = spec.name.as_str();
        let wrap = |err: StreamSQLError| StreamSQLError::provision(name, err.to_string());

        let existing = self.control_plane.get_connector(name).await.map_err(wrap)?;
        if existing.status == 200 {
            warn!("Connector {} already exists, deleting", name);
            let deleted = self
                .control_plane
                .delete_connector(name)
                .await
                .map_err(wrap)?;
            match deleted.status {
                204 | 404 => {
                    info!("Deleted existing connector {}", name);
                    sleep(self.config.settle_interval).await;
                }
                status => {
                    return Err(StreamSQLError::provision(
                        name,
                        format!("delete answered HTTP {}: {}", status, deleted.body),
                    ))
                }
            }
        }

        let created = self.control_plane.post_connector(spec).await.map_err(wrap)?;
        match created.status {
            201 | 409 => {
                info!("Connector {} created", name);
                Ok(())
            }
            status => Err(StreamSQLError::provision(
                name,
                format!("create answered HTTP {}: {}", status, created.body),
            )),
        }
    }

    /// Provisions every configured table. Individual failures are collected
    /// in the summary and do not stop the remaining jobs.
    pub async fn provision_all(
        &self,
        registry: &SourceRegistry,
        builder: &ConnectorSpecBuilder,
    ) -> StreamSQLResult<ProvisionSummary> {
        if !self.ensure_capacity().await {
            return Err(StreamSQLError::ControlPlaneUnavailable(format!(
                "no answer from {} after {} attempts",
                self.config.url, self.config.max_retries
            )));
        }

        let mut summary = ProvisionSummary::default();
        for source in registry.sources() {
            if source.tables.is_empty() {
                warn!("No tables configured for {}", source.source_id());
                continue;
            }
            info!(
                "Processing {} ({}): {:?}",
                source.source_id(),
                source.server_name,
                source.tables
            );

            for table in &source.tables {
                if summary.attempted > 0 {
                    sleep(self.config.creation_delay).await;
                }
                summary.attempted += 1;

                let result = match builder.build(source, table) {
                    Ok(spec) => {
                        info!("Topic for {} will be {}", spec.name, spec.topic_name());
                        self.create_or_replace(&spec).await
                    }
                    Err(err) => Err(err),
                };

                match result {
                    Ok(()) => summary.succeeded += 1,
                    Err(err) => {
                        error!("{}", err);
                        summary.failures.push(err);
                    }
                }
            }
        }

        info!(
            "Provisioning summary: attempted {}, created {}, failed {}",
            summary.attempted,
            summary.succeeded,
            summary.failed()
        );
        if summary.attempted > 0 && summary.succeeded == 0 {
            error!("No connectors were created successfully");
        }
        Ok(summary)
    }
}
