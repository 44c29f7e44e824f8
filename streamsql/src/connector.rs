pub mod config;
pub mod control_plane;
pub mod provisioner;
pub mod spec;

pub use config::{ConnectorDefaults, ControlPlaneConfig};
pub use control_plane::{ControlPlane, HttpReply, KafkaConnectClient};
pub use provisioner::{ConnectorProvisioner, ProvisionSummary};
pub use spec::{sanitize_table_name, ConnectorSpec, ConnectorSpecBuilder};
