use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Canonical operation kind. The single-letter capture codes never leave
/// this module.
#[derive(Debug, PartialEq, Eq, Deserialize, Serialize, Clone, Copy, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
    Snapshot,
    Unknown,
}

impl OperationKind {
    /// Unrecognised codes map to `Unknown` rather than failing.
    pub fn from_code(code: &str) -> Self {
        match code {
            "c" => OperationKind::Create,
            "u" => OperationKind::Update,
            "d" => OperationKind::Delete,
            "r" => OperationKind::Snapshot,
            _ => OperationKind::Unknown,
        }
    }

    pub fn is_snapshot(&self) -> bool {
        *self == OperationKind::Snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{from_str, to_string};

    #[test]
    fn test_operation_from_code() {
        assert_eq!(OperationKind::from_code("c"), OperationKind::Create);
        assert_eq!(OperationKind::from_code("u"), OperationKind::Update);
        assert_eq!(OperationKind::from_code("d"), OperationKind::Delete);
        assert_eq!(OperationKind::from_code("r"), OperationKind::Snapshot);
        assert_eq!(OperationKind::from_code("t"), OperationKind::Unknown);
        assert_eq!(OperationKind::from_code(""), OperationKind::Unknown);
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(OperationKind::Create.to_string(), "create");
        assert_eq!(OperationKind::Snapshot.as_ref(), "snapshot");
        assert_eq!(OperationKind::Unknown.to_string(), "unknown");
    }

    #[test]
    fn test_operation_serialization() {
        assert_eq!(to_string(&OperationKind::Update).unwrap(), "\"update\"");
        assert_eq!(
            from_str::<OperationKind>("\"delete\"").unwrap(),
            OperationKind::Delete
        );
    }
}
