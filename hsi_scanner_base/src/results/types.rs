//! # Probe Result Types
//!
//! Serializable records handed back to the host scanner: per-object results,
//! the host security level, and the report wrapping one probe session.

use crate::results::outcome::QueryOutcome;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Status of one collected item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Exists,
    NotCollected,
}

/// Collection status of one object (one requested identifier)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionFlag {
    /// Collection ran; items reflect what was found
    Complete,
    /// Collection was skipped or impossible in this mode
    NotCollected,
    /// Collection was attempted and failed
    Error,
}

/// One item produced for a requested identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedItem {
    pub stream_id: String,

    /// Result label, present only when the attribute resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_attr: Option<String>,

    pub status: ItemStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result for one requested identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectResult {
    pub stream_id: String,
    pub flag: CollectionFlag,
    pub items: Vec<CollectedItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

impl ObjectResult {
    pub fn new(stream_id: impl Into<String>, flag: CollectionFlag) -> Self {
        Self {
            stream_id: stream_id.into(),
            flag,
            items: Vec::new(),
            messages: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: CollectedItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    /// Label of the first item, if any resolved
    pub fn security_attr(&self) -> Option<&str> {
        self.items
            .iter()
            .find_map(|item| item.security_attr.as_deref())
    }
}

/// Host execution context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostContext {
    pub hostname: String,
    pub os_info: String,
}

impl HostContext {
    pub fn from_system() -> Self {
        Self {
            hostname: hostname::get()
                .unwrap_or_else(|_| std::ffi::OsString::from("unknown"))
                .to_string_lossy()
                .to_string(),
            os_info: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
        }
    }

    pub fn new(hostname: impl Into<String>, os_info: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            os_info: os_info.into(),
        }
    }
}

impl Default for HostContext {
    fn default() -> Self {
        Self::from_system()
    }
}

/// Parsed `HostSecurityId` value, e.g. `HSI:2! (v1.9.5)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSecurityLevel {
    pub level: u32,

    /// True when the ID carries the `!` runtime-issue suffix
    pub runtime_issues: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    pub raw: String,
}

fn hsi_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^HSI:(\d+)(\S*)(?:\s+\(v([^)]+)\))?").ok())
        .as_ref()
}

impl HostSecurityLevel {
    /// Parse a `HostSecurityId` string; `None` when it is not an HSI identifier
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let captures = hsi_pattern()?.captures(trimmed)?;
        let level = captures.get(1)?.as_str().parse().ok()?;
        let suffix = captures.get(2).map(|m| m.as_str()).unwrap_or("");

        Some(Self {
            level,
            runtime_issues: suffix.contains('!'),
            version: captures.get(3).map(|m| m.as_str().to_string()),
            raw: trimmed.to_string(),
        })
    }
}

/// Scan execution timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampInfo {
    /// RFC 3339
    pub scan_start: DateTime<Utc>,
    pub scan_end: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Outcome counts across a report's objects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub requested: u32,
    pub found: u32,
    pub not_found: u32,
    pub unavailable: u32,
}

impl ReportSummary {
    pub fn record(&mut self, outcome: &QueryOutcome) {
        self.requested += 1;
        match outcome {
            QueryOutcome::Found { .. } => self.found += 1,
            QueryOutcome::NotFound { .. } => self.not_found += 1,
            QueryOutcome::Unavailable { .. } => self.unavailable += 1,
        }
    }
}

/// Complete result of one probe session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeReport {
    pub report_id: String,
    pub host: HostContext,
    pub timestamp: TimestampInfo,
    pub offline_mode: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hsi_level: Option<HostSecurityLevel>,

    /// Why the host security level is absent, when it was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hsi_error: Option<String>,

    pub objects: Vec<ObjectResult>,
    pub summary: ReportSummary,
}

impl ProbeReport {
    pub fn new(host: HostContext, offline_mode: bool) -> Self {
        let now = Utc::now();
        Self {
            report_id: uuid::Uuid::new_v4().to_string(),
            host,
            timestamp: TimestampInfo {
                scan_start: now,
                scan_end: now,
                duration_ms: 0,
            },
            offline_mode,
            hsi_level: None,
            hsi_error: None,
            objects: Vec::new(),
            summary: ReportSummary::default(),
        }
    }

    pub fn add_object(&mut self, object: ObjectResult) {
        self.objects.push(object);
    }

    /// Stamp the end time
    pub fn finalize(&mut self) {
        self.timestamp.scan_end = Utc::now();
        self.timestamp.duration_ms = (self.timestamp.scan_end - self.timestamp.scan_start)
            .num_milliseconds()
            .max(0) as u64;
    }

    /// True when any object could not be collected because the service was unavailable
    pub fn has_unavailable(&self) -> bool {
        self.summary.unavailable > 0
    }

    pub fn object(&self, stream_id: &str) -> Option<&ObjectResult> {
        self.objects.iter().find(|o| o.stream_id == stream_id)
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        serde_json::to_string_pretty(self).map_err(|e| ReportError::Serialization {
            report_id: self.report_id.clone(),
            reason: e.to_string(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ReportError> {
        serde_json::from_str(json).map_err(|e| ReportError::Deserialization {
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to serialize report {report_id}: {reason}")]
    Serialization { report_id: String, reason: String },

    #[error("Failed to parse report: {reason}")]
    Deserialization { reason: String },

    #[error("Failed to write report to {path}: {reason}")]
    Write { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_security_id() {
        let level = HostSecurityLevel::parse("HSI:2! (v1.9.5)").unwrap();
        assert_eq!(level.level, 2);
        assert!(level.runtime_issues);
        assert_eq!(level.version.as_deref(), Some("1.9.5"));
        assert_eq!(level.raw, "HSI:2! (v1.9.5)");

        let level = HostSecurityLevel::parse("HSI:0").unwrap();
        assert_eq!(level.level, 0);
        assert!(!level.runtime_issues);
        assert_eq!(level.version, None);
    }

    #[test]
    fn test_parse_rejects_non_hsi() {
        assert!(HostSecurityLevel::parse("").is_none());
        assert!(HostSecurityLevel::parse("HSI:INVALID:1").is_none());
        assert!(HostSecurityLevel::parse("level 3").is_none());
    }

    #[test]
    fn test_report_json() {
        let mut report = ProbeReport::new(HostContext::new("host1", "linux x86_64"), false);
        report.add_object(
            ObjectResult::new("org.fwupd.hsi.Iommu", CollectionFlag::Complete).with_item(
                CollectedItem {
                    stream_id: "org.fwupd.hsi.Iommu".to_string(),
                    security_attr: Some("enabled".to_string()),
                    status: ItemStatus::Exists,
                    message: None,
                },
            ),
        );
        report.finalize();

        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["host"]["hostname"], "host1");
        assert_eq!(value["objects"][0]["flag"], "complete");
        assert_eq!(value["objects"][0]["items"][0]["status"], "exists");
        assert!(value.get("hsi_level").is_none());

        let parsed = ProbeReport::from_json(&json).unwrap();
        assert_eq!(parsed.report_id, report.report_id);
        assert_eq!(
            parsed.object("org.fwupd.hsi.Iommu").and_then(|o| o.security_attr()),
            Some("enabled")
        );
    }

    #[test]
    fn test_report_ids_are_unique() {
        let a = ProbeReport::new(HostContext::new("h", "o"), false);
        let b = ProbeReport::new(HostContext::new("h", "o"), false);
        assert_ne!(a.report_id, b.report_id);
    }
}
