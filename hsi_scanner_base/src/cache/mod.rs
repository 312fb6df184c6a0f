//! # Attribute Cache
//!
//! Append-only store of decoded records for one probe session. Lookups walk the
//! records in insertion order and return the first match.

use crate::decoder::AttributeRecord;
use crate::logging::codes;
use serde::{Deserialize, Serialize};

/// How a query key is compared with stored attribute names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Stored name must be a prefix of the key, compared over the stored name's length
    #[default]
    NamePrefix,
    /// Stored name must equal the key
    Exact,
}

impl MatchPolicy {
    /// Zero-length names never match
    pub fn matches(self, stored: &str, key: &str) -> bool {
        if stored.is_empty() {
            return false;
        }
        match self {
            MatchPolicy::NamePrefix => key.starts_with(stored),
            MatchPolicy::Exact => key == stored,
        }
    }
}

#[derive(Debug, Default)]
pub struct AttributeCache {
    records: Vec<AttributeRecord>,
    policy: MatchPolicy,
    populated: bool,
}

impl AttributeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: MatchPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// True iff no records have been appended this session
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True once a round-trip has been decoded into the cache, even an empty one
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    pub fn insert(&mut self, record: AttributeRecord) {
        self.records.push(record);
    }

    /// Append every record of one decoded reply and mark the cache populated
    pub fn populate<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = AttributeRecord>,
    {
        let before = self.records.len();
        self.records.extend(records);
        self.populated = true;
        self.records.len() - before
    }

    /// First record whose name matches `key` under the cache's policy
    pub fn lookup(&self, key: &str) -> Option<&AttributeRecord> {
        self.records
            .iter()
            .find(|record| self.policy.matches(&record.name, key))
    }

    pub fn records(&self) -> &[AttributeRecord] {
        &self.records
    }

    /// Log every cached record at debug level
    pub fn dump(&self) {
        log_debug!(codes::lookup::CACHE_DUMP, "Attribute cache contents",
            "records" => self.records.len(), "policy" => format!("{:?}", self.policy));
        for record in &self.records {
            log_debug!(codes::lookup::CACHE_DUMP, "Cached attribute",
                "name" => record.name, "result" => record.result_code);
        }
    }
}
