pub mod generic;
pub mod missing_value;

pub use generic::{StreamSQLError, StreamSQLResult};
pub use missing_value::MissingValueError;
