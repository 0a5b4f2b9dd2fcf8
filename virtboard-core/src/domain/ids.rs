use serde::{Deserialize, Serialize};
use std::fmt;

use super::record::Record;

/// Stable identity of a row: its position in the dataset as loaded.
///
/// Views never renumber rows, so containment between views is a question
/// about `RowId` sets, not row counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowId(pub usize);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Deterministic dataset hash (BLAKE3 over the canonical JSON encoding)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn of_records(records: &[Record]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for record in records {
            // Record serialization cannot fail: plain fields only.
            if let Ok(bytes) = serde_json::to_vec(record) {
                hasher.update(&bytes);
            }
            hasher.update(b"\n");
        }
        Self(hasher.finalize().to_hex().to_string())
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key of one aggregation group: a policy, optionally narrowed to one node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub policy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
}

impl GroupKey {
    pub fn policy(policy: impl Into<String>) -> Self {
        Self {
            policy: policy.into(),
            node: None,
        }
    }

    pub fn policy_node(policy: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            policy: policy.into(),
            node: Some(node.into()),
        }
    }

    /// Key for `record` at policy grain (`by_node == false`) or policy+node grain.
    pub fn for_record(record: &Record, by_node: bool) -> Self {
        Self {
            policy: record.policy.clone(),
            node: by_node.then(|| record.node.clone()),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.node {
            Some(node) => write!(f, "{} / {}", self.policy, node),
            None => write!(f, "{}", self.policy),
        }
    }
}
