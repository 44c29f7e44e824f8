use crate::error::missing_value::MissingValueError;
use rdkafka::error::KafkaError;
use std::error::Error;
use std::fmt::{self, Display};

pub type StreamSQLResult<T> = Result<T, StreamSQLError>;

#[derive(Debug)]
pub enum StreamSQLError {
    ConfigError(String),
    MissingValueError(MissingValueError),
    ControlPlaneUnavailable(String),
    ProvisionError { connector: String, reason: String },
    DecodeError(serde_json::Error),
    NormalizationError(String),
    WriteError(String),
    WorkerFatal(String),
    KafkaError(KafkaError),
    PostgresError(tokio_postgres::Error),
    PoolError(String),
    HttpError(reqwest::Error),
    StdIoError(std::io::Error),
    JoinError(tokio::task::JoinError),
}

impl StreamSQLError {
    pub fn provision<C, R>(connector: C, reason: R) -> Self
    where
        C: Into<String>,
        R: Into<String>,
    {
        StreamSQLError::ProvisionError {
            connector: connector.into(),
            reason: reason.into(),
        }
    }
}

impl Display for StreamSQLError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StreamSQLError::ConfigError(msg) => write!(f, "configuration error: {}", msg),
            StreamSQLError::MissingValueError(err) => write!(f, "{}", err),
            StreamSQLError::ControlPlaneUnavailable(msg) => {
                write!(f, "control plane unavailable: {}", msg)
            }
            StreamSQLError::ProvisionError { connector, reason } => {
                write!(f, "failed to provision connector '{}': {}", connector, reason)
            }
            StreamSQLError::DecodeError(err) => write!(f, "failed to decode message: {}", err),
            StreamSQLError::NormalizationError(msg) => {
                write!(f, "failed to normalize envelope: {}", msg)
            }
            StreamSQLError::WriteError(msg) => write!(f, "failed to write change record: {}", msg),
            StreamSQLError::WorkerFatal(msg) => write!(f, "worker cannot continue: {}", msg),
            StreamSQLError::KafkaError(err) => write!(f, "kafka error: {}", err),
            StreamSQLError::PostgresError(err) => {
                write!(f, "postgres error: {}", describe_postgres_error(err))
            }
            StreamSQLError::PoolError(msg) => write!(f, "connection pool error: {}", msg),
            StreamSQLError::HttpError(err) => write!(f, "http error: {}", err),
            StreamSQLError::StdIoError(err) => write!(f, "io error: {}", err),
            StreamSQLError::JoinError(err) => write!(f, "task join error: {}", err),
        }
    }
}

/// The bare `Display` of a driver error is only "db error"; the server
/// message, SQLSTATE and detail live in the wrapped `DbError`.
fn describe_postgres_error(err: &tokio_postgres::Error) -> String {
    if let Some(db) = err.as_db_error() {
        let mut text = format!("{} (SQLSTATE {})", db.message(), db.code().code());
        if let Some(detail) = db.detail() {
            text.push_str(": ");
            text.push_str(detail);
        }
        return text;
    }
    match err.source() {
        Some(cause) => format!("{}: {}", err, cause),
        None => err.to_string(),
    }
}

impl Error for StreamSQLError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StreamSQLError::MissingValueError(err) => Some(err),
            StreamSQLError::DecodeError(err) => Some(err),
            StreamSQLError::KafkaError(err) => Some(err),
            StreamSQLError::PostgresError(err) => Some(err),
            StreamSQLError::HttpError(err) => Some(err),
            StreamSQLError::StdIoError(err) => Some(err),
            StreamSQLError::JoinError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StreamSQLError {
    fn from(error: std::io::Error) -> Self {
        StreamSQLError::StdIoError(error)
    }
}

impl From<KafkaError> for StreamSQLError {
    fn from(error: KafkaError) -> Self {
        StreamSQLError::KafkaError(error)
    }
}

impl From<MissingValueError> for StreamSQLError {
    fn from(error: MissingValueError) -> Self {
        StreamSQLError::MissingValueError(error)
    }
}

impl From<serde_json::Error> for StreamSQLError {
    fn from(error: serde_json::Error) -> Self {
        StreamSQLError::DecodeError(error)
    }
}

impl From<tokio_postgres::Error> for StreamSQLError {
    fn from(error: tokio_postgres::Error) -> Self {
        StreamSQLError::PostgresError(error)
    }
}

impl From<deadpool_postgres::PoolError> for StreamSQLError {
    fn from(error: deadpool_postgres::PoolError) -> Self {
        StreamSQLError::PoolError(error.to_string())
    }
}

impl From<deadpool_postgres::BuildError> for StreamSQLError {
    fn from(error: deadpool_postgres::BuildError) -> Self {
        StreamSQLError::PoolError(error.to_string())
    }
}

impl From<reqwest::Error> for StreamSQLError {
    fn from(error: reqwest::Error) -> Self {
        StreamSQLError::HttpError(error)
    }
}

impl From<tokio::task::JoinError> for StreamSQLError {
    fn from(error: tokio::task::JoinError) -> Self {
        StreamSQLError::JoinError(error)
    }
}
