//! DNS provider abstraction layer
//!
//! This module defines the record types exchanged with the provider and a
//! trait for the four record operations the reconciler drives.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

//==============================================================================
// Types
//==============================================================================

/// A DNS record as the provider represents it
///
/// Fields other than `id`, `type`, `name` and `data` (priority, port, ttl,
/// weight, flags, tag, ...) are kept in `metadata` untouched so that an
/// update sends them back exactly as they were received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Provider-assigned identifier; absent on records about to be created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// The type of DNS record (e.g., "A", "AAAA", "TXT")
    #[serde(rename = "type")]
    pub record_type: String,
    /// Host name relative to the domain ("@" for the apex)
    pub name: String,
    /// Record value
    #[serde(default)]
    pub data: String,
    /// Provider-specific fields this program never inspects
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl DomainRecord {
    /// Builds a record to be created
    pub fn new(record_type: &str, name: &str, data: &str) -> Self {
        Self {
            id: None,
            record_type: record_type.to_string(),
            name: name.to_string(),
            data: data.to_string(),
            metadata: Map::new(),
        }
    }

    /// Whether this record is the one identified by `(record_type, name)`
    ///
    /// DNS names are case-insensitive, so is the comparison.
    pub fn matches(&self, record_type: &str, name: &str) -> bool {
        self.record_type.eq_ignore_ascii_case(record_type) && self.name.eq_ignore_ascii_case(name)
    }

    /// Update payload: same record with a new value and no identifier
    pub fn with_data(&self, data: &str) -> Self {
        Self {
            id: None,
            data: data.to_string(),
            ..self.clone()
        }
    }
}

impl fmt::Display for DomainRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(
                f,
                "{} {} -> {} (ID: {})",
                self.record_type, self.name, self.data, id
            ),
            None => write!(f, "{} {} -> {}", self.record_type, self.name, self.data),
        }
    }
}

/// Wrapper of the provider's record listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordList {
    #[serde(rename = "domain_records", default)]
    pub records: Vec<DomainRecord>,
}

impl RecordList {
    /// First record with matching `(record_type, name)`
    pub fn find(&self, record_type: &str, name: &str) -> Option<&DomainRecord> {
        self.records.iter().find(|r| r.matches(record_type, name))
    }
}

/// Wrapper of a single record returned by create and update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordResponse {
    #[serde(rename = "domain_record")]
    pub record: DomainRecord,
}

//==============================================================================
// Trait
//==============================================================================

/// DNS provider trait for managing the records of a domain
///
/// Every call carries the API key of the domain it targets, so a single
/// provider value can serve every configured domain.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Lists every record of `domain`
    async fn list_records(&self, domain: &str, api_key: &str) -> anyhow::Result<RecordList>;

    /// Creates `record` and returns it with its assigned identifier
    async fn create_record(
        &self,
        domain: &str,
        api_key: &str,
        record: &DomainRecord,
    ) -> anyhow::Result<DomainRecord>;

    /// Replaces the record identified by `id` with `record`
    ///
    /// `record.id` is expected to be unset; the identity travels in the path.
    async fn update_record(
        &self,
        domain: &str,
        api_key: &str,
        id: u64,
        record: &DomainRecord,
    ) -> anyhow::Result<DomainRecord>;

    /// Deletes the record identified by `id`
    async fn delete_record(&self, domain: &str, api_key: &str, id: u64) -> anyhow::Result<()>;
}

//==============================================================================
// Tests
//==============================================================================
