use clap::Parser;
use streamsql::kafka::KafkaConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Do not create or replace capture connectors.
    #[arg(long)]
    pub skip_provision: bool,

    /// Provision connectors and exit without consuming.
    #[arg(long)]
    pub skip_consume: bool,

    /// Overrides KAFKA_BOOTSTRAP_SERVERS for the consumers.
    #[arg(long)]
    pub bootstrap_servers: Option<String>,
}

impl Args {
    pub fn apply_to_kafka_config(&self, config: &mut KafkaConfig) {
        if let Some(bootstrap_servers) = &self.bootstrap_servers {
            config.bootstrap_servers = bootstrap_servers.clone();
        }
    }
}
