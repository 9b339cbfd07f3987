use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{BufReader, Read};

/// Organization identifier of a cluster owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(pub u32);

/// Account number of a cluster owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(pub u32);

/// Offset of the Kafka message the cluster report arrived in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KafkaOffset(pub i64);

/// Cluster identifier, compared by exact string equality
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterName(String);

impl ClusterName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClusterName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ClusterName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for ClusterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One managed cluster considered for notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterEntry {
    pub org_id: OrgId,
    pub account_number: AccountNumber,
    pub cluster_name: ClusterName,
    pub kafka_offset: KafkaOffset,
    pub updated_at: DateTime<Utc>,
}

/// Anything the cluster filter can decide on.
///
/// The filter only ever looks at the cluster name, so upstream stages can
/// run their own record types through it without converting to
/// [`ClusterEntry`] first.
pub trait ClusterRecord {
    fn cluster_name(&self) -> &str;
}

impl ClusterRecord for ClusterEntry {
    #[inline]
    fn cluster_name(&self) -> &str {
        self.cluster_name.as_str()
    }
}

impl<T: ClusterRecord + ?Sized> ClusterRecord for &T {
    #[inline]
    fn cluster_name(&self) -> &str {
        (**self).cluster_name()
    }
}

/// Errors raised while reading or writing cluster lists
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// Underlying reader or writer failed.
    #[error("cluster list I/O failed")]
    Io(#[from] std::io::Error),

    /// Input was not a JSON array of cluster entries.
    #[error("malformed cluster list")]
    Parse(#[source] serde_json::Error),

    /// Filtered entries could not be serialized.
    #[error("failed to serialize cluster list")]
    Serialize(#[source] serde_json::Error),
}

/// Parse a JSON array of cluster entries.
///
/// `null` at the top level is accepted and yields an empty list, matching
/// producers that serialize an absent list that way.
pub fn parse_cluster_entries<R: Read>(reader: R) -> Result<Vec<ClusterEntry>, ClusterError> {
    let reader = BufReader::new(reader);
    let entries: Option<Vec<ClusterEntry>> =
        serde_json::from_reader(reader).map_err(|e| {
            if e.is_io() {
                ClusterError::Io(e.into())
            } else {
                ClusterError::Parse(e)
            }
        })?;

    Ok(entries.unwrap_or_default())
}
