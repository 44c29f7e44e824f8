pub mod config;
pub mod postgres;
pub mod store;
pub mod writer;

pub use config::SinkConfig;
pub use postgres::{schema_statements, PostgresChangeStore};
pub use store::ChangeStore;
pub use writer::{ChangeStoreWriter, WriterStats};
