//! # HSI Probe
//!
//! Session facade tying a transport, the reconciler and result rendering
//! together. One probe is one session: the attribute reply is fetched at most
//! once (successfully) for its lifetime.

use crate::api::config::ProbeConfig;
use crate::decoder::AttributeRecord;
use crate::logging::codes;
use crate::reconciler::QueryReconciler;
use crate::results::{
    result_to_label, HostContext, HostSecurityLevel, ProbeReport, QueryOutcome, ResultGenerator,
    UnavailableReason,
};
use crate::strategies::transport::HOST_SECURITY_ID_PROPERTY;
use crate::strategies::{HostSecurityTransport, ProtocolError, TransportError};
use serde::Serialize;

/// One cached attribute with its printable label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeListing {
    pub name: String,
    pub result_code: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'static str>,
}

impl From<AttributeRecord> for AttributeListing {
    fn from(record: AttributeRecord) -> Self {
        Self {
            label: result_to_label(record.result_code),
            name: record.name,
            result_code: record.result_code,
        }
    }
}

pub struct HsiProbe<T: HostSecurityTransport> {
    reconciler: QueryReconciler<T>,
    offline_mode: bool,
    host: HostContext,
}

impl<T: HostSecurityTransport> HsiProbe<T> {
    pub fn new(transport: T, config: &ProbeConfig) -> Self {
        Self {
            reconciler: QueryReconciler::new(transport, config.match_policy),
            offline_mode: config.offline_mode,
            host: HostContext::from_system(),
        }
    }

    pub fn with_host(mut self, host: HostContext) -> Self {
        self.host = host;
        self
    }

    /// Whether unavailability is reported as "not collected" rather than an error
    pub fn offline_mode(&self) -> bool {
        self.offline_mode
    }

    pub fn resolve(&self, identifier: &str) -> QueryOutcome {
        self.reconciler.resolve(identifier)
    }

    /// Every cached attribute in reply order
    pub fn list_attributes(&self) -> Result<Vec<AttributeListing>, UnavailableReason> {
        Ok(self
            .reconciler
            .attributes()?
            .into_iter()
            .map(AttributeListing::from)
            .collect())
    }

    /// Read and parse the `HostSecurityId` property
    pub fn host_security_level(&self) -> Result<HostSecurityLevel, TransportError> {
        let raw = self.reconciler.transport().fetch_host_security_id()?;
        HostSecurityLevel::parse(&raw).ok_or_else(|| {
            ProtocolError::UnexpectedShape {
                location: HOST_SECURITY_ID_PROPERTY.to_string(),
                expected: "HSI:<level>".to_string(),
                found: raw,
            }
            .into()
        })
    }

    /// Resolve each identifier in order and build the session report
    pub fn collect<S: AsRef<str>>(&self, identifiers: &[S], include_hsi: bool) -> ProbeReport {
        let mut report = ProbeReport::new(self.host.clone(), self.offline_mode);

        for identifier in identifiers {
            let identifier = identifier.as_ref();
            let outcome = self.reconciler.resolve(identifier);
            report.summary.record(&outcome);
            report.add_object(ResultGenerator::render(
                &outcome,
                identifier,
                self.offline_mode,
            ));
        }

        if include_hsi {
            match self.host_security_level() {
                Ok(level) => report.hsi_level = Some(level),
                Err(err) => {
                    log_warning!(codes::transport::HOST_SECURITY_ID_UNAVAILABLE,
                        "Host security level unavailable", "error" => err);
                    report.hsi_error = Some(err.to_string());
                }
            }
        }

        report.finalize();
        log_success!(codes::success::REPORT_COMPLETED, "Probe report completed",
            "report_id" => report.report_id,
            "requested" => report.summary.requested,
            "found" => report.summary.found,
            "unavailable" => report.summary.unavailable,
            "duration_ms" => report.timestamp.duration_ms);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MatchPolicy;
    use crate::results::{CollectionFlag, ItemStatus, NotFoundReason, SecurityAttrResult};
    use crate::strategies::ReplayTransport;
    use assert_matches::assert_matches;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CAPTURED_REPLY: &str = r#"{"type":"aa{sv}","data":[[
        {"AppstreamId":{"type":"s","data":"org.fwupd.hsi.Uefi.SecureBoot"},"HsiResult":{"type":"u","data":1},"HsiLevel":{"type":"u","data":1}},
        {"AppstreamId":{"type":"s","data":"org.fwupd.hsi.Kernel.Tainted"},"HsiResult":{"type":"u","data":9},"Flags":{"type":"t","data":2}},
        {"AppstreamId":{"type":"s","data":"org.fwupd.hsi.Tpm.Version20"},"HsiResult":{"type":"u","data":0}},
        {"Plugin":{"type":"s","data":"tpm"}}
    ]]}"#;

    fn capture(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    fn probe(transport: ReplayTransport, offline_mode: bool) -> HsiProbe<ReplayTransport> {
        let config = ProbeConfig::default()
            .with_offline_mode(offline_mode)
            .with_match_policy(MatchPolicy::NamePrefix);
        HsiProbe::new(transport, &config).with_host(HostContext::new("test-host", "linux x86_64"))
    }

    #[test]
    fn test_collect_from_captured_reply() {
        let attrs = capture(CAPTURED_REPLY);
        let probe = probe(ReplayTransport::new(attrs.path()), false);

        let report = probe.collect(
            &[
                "org.fwupd.hsi.Uefi.SecureBoot",
                "org.fwupd.hsi.Kernel.Tainted",
                "org.fwupd.hsi.Tpm.Version20",
                "org.fwupd.hsi.Iommu",
            ],
            false,
        );

        assert_eq!(report.summary.requested, 4);
        assert_eq!(report.summary.found, 2);
        assert_eq!(report.summary.not_found, 2);
        assert!(!report.has_unavailable());
        assert_eq!(report.host.hostname, "test-host");

        let secure_boot = report.object("org.fwupd.hsi.Uefi.SecureBoot").unwrap();
        assert_eq!(secure_boot.security_attr(), Some("enabled"));
        assert_eq!(
            report.object("org.fwupd.hsi.Kernel.Tainted").unwrap().security_attr(),
            Some("tainted")
        );

        let iommu = report.object("org.fwupd.hsi.Iommu").unwrap();
        assert_eq!(iommu.flag, CollectionFlag::Complete);
        assert_eq!(iommu.items[0].status, ItemStatus::NotCollected);
        assert_eq!(iommu.items[0].message.as_deref(), Some("Attribute not found"));
    }

    #[test]
    fn test_list_attributes_keeps_reply_order() {
        let attrs = capture(CAPTURED_REPLY);
        let probe = probe(ReplayTransport::new(attrs.path()), false);

        let listing = probe.list_attributes().unwrap();
        let names: Vec<_> = listing.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "org.fwupd.hsi.Uefi.SecureBoot",
                "org.fwupd.hsi.Kernel.Tainted",
                "org.fwupd.hsi.Tpm.Version20",
            ]
        );
        assert_eq!(listing[0].label, Some("enabled"));
        assert_eq!(listing[2].label, None);
    }

    #[test]
    fn test_unavailable_offline_and_online() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("attrs.json");

        let report = probe(ReplayTransport::new(&missing), true)
            .collect(&["org.fwupd.hsi.Iommu"], false);
        assert!(report.has_unavailable());
        assert!(report.offline_mode);
        assert_eq!(report.objects[0].flag, CollectionFlag::NotCollected);

        let report = probe(ReplayTransport::new(&missing), false)
            .collect(&["org.fwupd.hsi.Iommu"], false);
        assert_eq!(report.objects[0].flag, CollectionFlag::Error);
        assert!(report.objects[0].items.is_empty());
    }

    #[test]
    fn test_bad_variant_does_not_void_other_attributes() {
        let attrs = capture(
            r#"{"type":"aa{sv}","data":[[
                {"AppstreamId":{"type":"s","data":"org.fwupd.hsi.Uefi.SecureBoot"},"HsiResult":{"type":"u","data":1}},
                {"AppstreamId":{"type":"s","data":"org.fwupd.hsi.Iommu"},"HsiResult":{"type":"u"}}
            ]]}"#,
        );
        let probe = probe(ReplayTransport::new(attrs.path()), false);

        assert_matches!(
            probe.resolve("org.fwupd.hsi.Uefi.SecureBoot"),
            QueryOutcome::Found { result: SecurityAttrResult::Enabled, .. }
        );
        assert_matches!(
            probe.resolve("org.fwupd.hsi.Iommu"),
            QueryOutcome::NotFound { reason: NotFoundReason::NoResult, .. }
        );
    }

    #[test]
    fn test_offline_mode_follows_config() {
        let attrs = capture(CAPTURED_REPLY);
        assert!(probe(ReplayTransport::new(attrs.path()), true).offline_mode());
        assert!(!probe(ReplayTransport::new(attrs.path()), false).offline_mode());
    }

    #[test]
    fn test_host_security_level() {
        let attrs = capture(CAPTURED_REPLY);
        let hsi = capture(r#"{"type":"s","data":"HSI:2! (v1.9.5)"}"#);
        let probe = probe(
            ReplayTransport::new(attrs.path()).with_host_security_id(hsi.path()),
            false,
        );

        let report = probe.collect(&["org.fwupd.hsi.Uefi.SecureBoot"], true);
        let level = report.hsi_level.unwrap();
        assert_eq!(level.level, 2);
        assert!(level.runtime_issues);
        assert!(report.hsi_error.is_none());
    }

    #[test]
    fn test_host_security_level_failure_is_reported() {
        let attrs = capture(CAPTURED_REPLY);
        let bogus = capture(r#"{"type":"s","data":"not an hsi"}"#);

        let probe_without = probe(ReplayTransport::new(attrs.path()), false);
        let report = probe_without.collect(&["org.fwupd.hsi.Uefi.SecureBoot"], true);
        assert!(report.hsi_level.is_none());
        assert!(report.hsi_error.is_some());
        assert_eq!(report.summary.found, 1);

        let probe_bogus = probe(
            ReplayTransport::new(attrs.path()).with_host_security_id(bogus.path()),
            false,
        );
        assert_matches!(
            probe_bogus.host_security_level(),
            Err(TransportError::Protocol(ProtocolError::UnexpectedShape { .. }))
        );
    }
}
