use crate::error::{StreamSQLError, StreamSQLResult};
use crate::event::config::NormalizerConfig;
use crate::event::envelope::RawEnvelope;
use crate::event::operation::OperationKind;
use crate::event::record::ChangeRecord;
use crate::kafka::discovery::TopicBinding;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

/// Turns raw envelopes into [`ChangeRecord`]s.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Normalizer { config }
    }

    pub fn normalize(
        &self,
        envelope: &RawEnvelope,
        binding: &TopicBinding,
    ) -> StreamSQLResult<ChangeRecord> {
        self.normalize_at(envelope, binding, Utc::now())
    }

    pub fn normalize_at(
        &self,
        envelope: &RawEnvelope,
        binding: &TopicBinding,
        processed_at: DateTime<Utc>,
    ) -> StreamSQLResult<ChangeRecord> {
        if !envelope.body().is_object() {
            return Err(StreamSQLError::NormalizationError(format!(
                "expected a JSON object on {}, got {}",
                binding.topic,
                type_name(envelope.body())
            )));
        }

        let operation = envelope
            .op_code()
            .map(OperationKind::from_code)
            .unwrap_or(OperationKind::Unknown);

        let database = envelope
            .source_field("db")
            .unwrap_or(binding.database.as_str());
        let source_table = match (envelope.source_field("schema"), envelope.source_field("table")) {
            (Some(schema), Some(table)) => format!("{}.{}", schema, table),
            (None, Some(table)) => table.to_string(),
            _ => binding.table.clone(),
        };
        let source_server = envelope
            .source_field("name")
            .unwrap_or(binding.server_name.as_str())
            .to_string();

        let origin_ts_ms = envelope.ts_ms().unwrap_or(0);
        let change_timestamp = match Utc.timestamp_millis_opt(origin_ts_ms).single() {
            Some(ts) if origin_ts_ms > 0 => ts,
            _ => processed_at,
        };

        Ok(ChangeRecord {
            source_database: format!("{} ({})", binding.source_id, database),
            source_table,
            source_server,
            topic_name: binding.topic.clone(),
            operation,
            record_id: self.extract_record_id(envelope),
            origin_ts_ms,
            change_timestamp,
            before_data: serialize_image(envelope.before()),
            after_data: serialize_image(envelope.after()),
            full_payload: envelope.body().to_string(),
            processed_at,
        })
    }

    /// First configured id field found in the after image, then the before
    /// image. Null values count as absent.
    pub fn extract_record_id(&self, envelope: &RawEnvelope) -> Option<String> {
        [envelope.after(), envelope.before()]
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
            .find_map(|image| {
                self.config
                    .id_fields
                    .iter()
                    .filter_map(|field| image.get(field))
                    .find(|value| !value.is_null())
                    .map(id_to_string)
            })
    }
}

fn id_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Missing and empty images are stored as NULL.
fn serialize_image(image: Option<&Value>) -> Option<String> {
    match image {
        None => None,
        Some(Value::Object(map)) if map.is_empty() => None,
        Some(value) => Some(value.to_string()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
