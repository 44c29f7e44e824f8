use crate::error::StreamSQLResult;
use serde_json::Value;

/// A change message as received, kept as a loose JSON value until it is
/// normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEnvelope {
    body: Value,
}

impl RawEnvelope {
    pub fn new(body: Value) -> Self {
        RawEnvelope { body }
    }

    /// Parses a message body. Messages produced with converter schemas
    /// enabled (`{"schema": .., "payload": ..}`) are unwrapped to the payload.
    pub fn decode(bytes: &[u8]) -> StreamSQLResult<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Ok(RawEnvelope::new(unwrap_payload(value)))
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn op_code(&self) -> Option<&str> {
        self.body.get("op").and_then(Value::as_str)
    }

    pub fn before(&self) -> Option<&Value> {
        self.body.get("before").filter(|v| !v.is_null())
    }

    pub fn after(&self) -> Option<&Value> {
        self.body.get("after").filter(|v| !v.is_null())
    }

    pub fn source_field(&self, field: &str) -> Option<&str> {
        self.body
            .get("source")
            .and_then(|source| source.get(field))
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Event time in milliseconds, from the envelope or its source block.
    pub fn ts_ms(&self) -> Option<i64> {
        self.body
            .get("ts_ms")
            .and_then(Value::as_i64)
            .or_else(|| {
                self.body
                    .get("source")
                    .and_then(|source| source.get("ts_ms"))
                    .and_then(Value::as_i64)
            })
    }
}

fn unwrap_payload(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("schema") && map.contains_key("payload") => {
            map.remove("payload").unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StreamSQLError;
    use serde_json::json;

    #[test]
    fn test_decode_bare_envelope() {
        let envelope = RawEnvelope::decode(br#"{"op":"u","ts_ms":10}"#).unwrap();
        assert_eq!(envelope.op_code(), Some("u"));
        assert_eq!(envelope.ts_ms(), Some(10));
    }

    #[test]
    fn test_decode_unwraps_schema_payload() {
        let raw = json!({
            "schema": {"type": "struct"},
            "payload": {"op": "c", "after": {"id": 1}}
        });
        let envelope = RawEnvelope::decode(raw.to_string().as_bytes()).unwrap();
        assert_eq!(envelope.op_code(), Some("c"));
        assert_eq!(envelope.after(), Some(&json!({"id": 1})));
        assert!(envelope.body().get("schema").is_none());
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        assert!(matches!(
            RawEnvelope::decode(b"not json {"),
            Err(StreamSQLError::DecodeError(_))
        ));
    }

    #[test]
    fn test_source_fields_and_timestamp_fallback() {
        let envelope = RawEnvelope::new(json!({
            "op": "d",
            "before": {"id": 3},
            "after": null,
            "source": {"db": "TestCDC", "table": "", "ts_ms": 99}
        }));
        assert_eq!(envelope.source_field("db"), Some("TestCDC"));
        assert_eq!(envelope.source_field("table"), None);
        assert_eq!(envelope.after(), None);
        assert_eq!(envelope.ts_ms(), Some(99));
    }
}
