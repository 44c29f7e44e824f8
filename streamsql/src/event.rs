pub mod config;
pub mod envelope;
pub mod normalizer;
pub mod operation;
pub mod record;

pub use config::NormalizerConfig;
pub use envelope::RawEnvelope;
pub use normalizer::Normalizer;
pub use operation::OperationKind;
pub use record::ChangeRecord;
