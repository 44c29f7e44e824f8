use crate::env::EnvSource;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RECORD_ID_FIELDS: [&str; 7] = [
    "CustomerID",
    "Id",
    "ID",
    "id",
    "CustomerId",
    "EmployeeID",
    "ProductID",
];

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct NormalizerConfig {
    /// Candidate identifier fields, highest priority first.
    pub id_fields: Vec<String>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        NormalizerConfig {
            id_fields: DEFAULT_RECORD_ID_FIELDS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

impl NormalizerConfig {
    pub fn from_env(env: &dyn EnvSource) -> Self {
        let id_fields: Vec<String> = env
            .var("RECORD_ID_FIELDS")
            .map(|fields| {
                fields
                    .split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        if id_fields.is_empty() {
            return NormalizerConfig::default();
        }
        NormalizerConfig { id_fields }
    }
}
