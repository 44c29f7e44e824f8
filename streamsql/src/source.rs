pub mod config;
pub mod registry;

pub use config::{SourceConfig, TunableOverrides};
pub use registry::{load_sources, parse_source, parse_table_list, SourceRegistry};
