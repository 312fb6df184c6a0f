//! # Query Reconciler
//!
//! Resolves caller identifiers against the session's attribute cache, running
//! the single transport round-trip on first use.
//!
//! The "populated? → fetch → decode → insert" sequence runs under the cache
//! lock, so concurrent callers never duplicate the round-trip or observe a
//! half-filled cache.

use crate::cache::{AttributeCache, MatchPolicy};
use crate::decoder::{self, AttributeRecord};
use crate::logging::codes;
use crate::results::formatter::SecurityAttrResult;
use crate::results::outcome::{NotFoundReason, QueryOutcome, UnavailableReason};
use crate::strategies::{HostSecurityTransport, TransportError};
use std::sync::{Mutex, MutexGuard};

pub struct QueryReconciler<T: HostSecurityTransport> {
    transport: T,
    cache: Mutex<AttributeCache>,
}

impl<T: HostSecurityTransport> QueryReconciler<T> {
    pub fn new(transport: T, policy: MatchPolicy) -> Self {
        Self::with_cache(transport, AttributeCache::with_policy(policy))
    }

    /// Use a caller-supplied cache (possibly pre-populated)
    pub fn with_cache(transport: T, cache: AttributeCache) -> Self {
        Self {
            transport,
            cache: Mutex::new(cache),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Resolve one identifier; never panics, every path yields an outcome
    pub fn resolve(&self, identifier: &str) -> QueryOutcome {
        let mut cache = self.lock_cache();

        if let Err(reason) = self.ensure_populated(&mut cache) {
            return QueryOutcome::Unavailable { reason };
        }

        let record = match cache.lookup(identifier) {
            Some(record) => record,
            None => {
                log_info!(codes::lookup::ATTRIBUTE_NOT_FOUND, "No attribute matches identifier",
                    "identifier" => identifier);
                return QueryOutcome::NotFound {
                    queried_name: identifier.to_string(),
                    reason: NotFoundReason::NoMatch,
                };
            }
        };

        if !record.has_result() {
            log_warning!(codes::lookup::NO_RESULT, "Matched attribute carries no result",
                "identifier" => identifier, "name" => record.name);
            return QueryOutcome::NotFound {
                queried_name: identifier.to_string(),
                reason: NotFoundReason::NoResult,
            };
        }

        match SecurityAttrResult::from_code(record.result_code) {
            Some(result) => {
                log_success!(codes::success::ATTRIBUTE_RESOLVED, "Attribute resolved",
                    "identifier" => identifier, "name" => record.name, "result" => result);
                QueryOutcome::Found {
                    name: identifier.to_string(),
                    result,
                }
            }
            None => {
                log_warning!(codes::lookup::UNREPRESENTABLE_RESULT, "Attribute result code has no label",
                    "identifier" => identifier, "code" => record.result_code);
                QueryOutcome::NotFound {
                    queried_name: identifier.to_string(),
                    reason: NotFoundReason::Unrepresentable {
                        code: record.result_code,
                    },
                }
            }
        }
    }

    /// Snapshot of every cached attribute, populating the cache if needed
    pub fn attributes(&self) -> Result<Vec<AttributeRecord>, UnavailableReason> {
        let mut cache = self.lock_cache();
        self.ensure_populated(&mut cache)?;
        Ok(cache.records().to_vec())
    }

    pub fn is_populated(&self) -> bool {
        self.lock_cache().is_populated()
    }

    fn lock_cache(&self) -> MutexGuard<'_, AttributeCache> {
        // Records are only appended after a full decode, so a poisoned guard
        // still holds a consistent cache.
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_populated(&self, cache: &mut AttributeCache) -> Result<(), UnavailableReason> {
        if cache.is_populated() {
            return Ok(());
        }

        let message = self.transport.fetch_security_attrs().map_err(|err| {
            let code = match &err {
                TransportError::Unavailable { .. } => codes::transport::SERVICE_UNREACHABLE,
                TransportError::CallFailed { .. } => codes::transport::CALL_FAILED,
                TransportError::Protocol(_) => codes::transport::REPLY_UNPARSABLE,
            };
            log_error!(code, "Security attribute round-trip failed",
                "transport" => self.transport.transport_id(), "error" => err);
            UnavailableReason::from(&err)
        })?;

        let records = decoder::decode(&message)
            .map_err(|err| UnavailableReason::Protocol(err.to_string()))?;
        let count = cache.populate(records);

        log_success!(codes::success::CACHE_POPULATED, "Attribute cache populated",
            "transport" => self.transport.transport_id(), "records" => count);
        cache.dump();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{BusMessage, BusValue};
    use crate::decoder::{NAME_FIELD, RESULT_FIELD};
    use crate::strategies::ProtocolError;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Serves a fixed reply (or failure) and counts round-trips
    struct CountingTransport {
        reply: Option<BusMessage>,
        calls: AtomicUsize,
    }

    impl CountingTransport {
        fn serving(maps: Vec<BusValue>) -> Self {
            Self {
                reply: Some(BusMessage::method_return(vec![BusValue::Array(maps)])),
                calls: AtomicUsize::new(0),
            }
        }

        fn message(message: BusMessage) -> Self {
            Self {
                reply: Some(message),
                calls: AtomicUsize::new(0),
            }
        }

        fn unreachable() -> Self {
            Self {
                reply: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HostSecurityTransport for CountingTransport {
        fn transport_id(&self) -> &str {
            "counting"
        }

        fn fetch_security_attrs(&self) -> Result<BusMessage, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone().ok_or_else(|| {
                TransportError::unavailable("org.freedesktop.fwupd", "Failed to connect to bus")
            })
        }

        fn fetch_host_security_id(&self) -> Result<String, TransportError> {
            Ok("HSI:1 (v1.9.5)".to_string())
        }
    }

    fn attr_map(name: &str, result: u32) -> BusValue {
        BusValue::Array(vec![
            BusValue::property(NAME_FIELD, BusValue::string(name)),
            BusValue::property(RESULT_FIELD, BusValue::UInt32(result)),
        ])
    }

    #[test]
    fn test_found_with_label() {
        let transport = CountingTransport::serving(vec![attr_map("HSI:BiosOverlock", 1)]);
        let reconciler = QueryReconciler::new(transport, MatchPolicy::NamePrefix);

        let outcome = reconciler.resolve("HSI:BiosOverlock");
        assert_eq!(
            outcome,
            QueryOutcome::Found {
                name: "HSI:BiosOverlock".to_string(),
                result: SecurityAttrResult::Enabled,
            }
        );
        assert_eq!(outcome.status_label(), Some("enabled"));
    }

    #[test]
    fn test_empty_reply_resolves_not_found() {
        let transport = CountingTransport::serving(vec![]);
        let reconciler = QueryReconciler::new(transport, MatchPolicy::NamePrefix);

        assert_matches!(
            reconciler.resolve("org.fwupd.hsi.Uefi.SecureBoot"),
            QueryOutcome::NotFound { reason: NotFoundReason::NoMatch, .. }
        );
        assert_matches!(
            reconciler.resolve("anything"),
            QueryOutcome::NotFound { reason: NotFoundReason::NoMatch, .. }
        );
        // An empty reply still counts as the session's round-trip
        assert_eq!(reconciler.transport().calls(), 1);
    }

    #[test]
    fn test_unreachable_transport_is_unavailable() {
        let reconciler =
            QueryReconciler::new(CountingTransport::unreachable(), MatchPolicy::NamePrefix);

        let outcome = reconciler.resolve("org.fwupd.hsi.Uefi.SecureBoot");
        assert_matches!(
            &outcome,
            QueryOutcome::Unavailable { reason: UnavailableReason::ServiceUnreachable(detail) }
                if detail.contains("Failed to connect")
        );
        assert!(outcome.is_unavailable());
        assert!(!reconciler.is_populated());

        // Not retried within a resolution, but the next resolution tries again
        assert_eq!(reconciler.transport().calls(), 1);
        reconciler.resolve("org.fwupd.hsi.Uefi.SecureBoot");
        assert_eq!(reconciler.transport().calls(), 2);
    }

    #[test]
    fn test_malformed_entry_does_not_void_other_maps() {
        let transport = CountingTransport::serving(vec![
            attr_map("org.fwupd.hsi.Uefi.SecureBoot", 1),
            BusValue::Array(vec![
                BusValue::string(RESULT_FIELD),
                BusValue::property(NAME_FIELD, BusValue::string("org.fwupd.hsi.Iommu")),
            ]),
            attr_map("org.fwupd.hsi.Kernel.Tainted", 10),
        ]);
        let reconciler = QueryReconciler::new(transport, MatchPolicy::NamePrefix);

        assert_eq!(
            reconciler.resolve("org.fwupd.hsi.Kernel.Tainted").status_label(),
            Some("not-tainted")
        );
        assert_matches!(
            reconciler.resolve("org.fwupd.hsi.Iommu"),
            QueryOutcome::NotFound { reason: NotFoundReason::NoResult, .. }
        );
        assert_eq!(reconciler.attributes().unwrap().len(), 3);
    }

    #[test]
    fn test_unrepresentable_result_is_not_found() {
        let transport = CountingTransport::serving(vec![
            attr_map("org.fwupd.hsi.Unknown", 0),
            attr_map("org.fwupd.hsi.Future", 99),
        ]);
        let reconciler = QueryReconciler::new(transport, MatchPolicy::Exact);

        assert_matches!(
            reconciler.resolve("org.fwupd.hsi.Unknown"),
            QueryOutcome::NotFound { reason: NotFoundReason::Unrepresentable { code: 0 }, .. }
        );
        assert_matches!(
            reconciler.resolve("org.fwupd.hsi.Future"),
            QueryOutcome::NotFound { reason: NotFoundReason::Unrepresentable { code: 99 }, .. }
        );
    }

    #[test]
    fn test_protocol_error_is_unavailable() {
        let transport =
            CountingTransport::message(BusMessage::method_return(vec![BusValue::UInt32(1)]));
        let reconciler = QueryReconciler::new(transport, MatchPolicy::NamePrefix);

        assert_matches!(
            reconciler.resolve("x"),
            QueryOutcome::Unavailable { reason: UnavailableReason::Protocol(_) }
        );
        assert!(!reconciler.is_populated());
    }

    #[test]
    fn test_error_reply_is_unavailable() {
        let transport = CountingTransport::message(BusMessage::error(
            "org.freedesktop.fwupd.NotSupported",
            "HSI not supported",
        ));
        let reconciler = QueryReconciler::new(transport, MatchPolicy::NamePrefix);

        let expected = ProtocolError::ErrorReply {
            name: "org.freedesktop.fwupd.NotSupported".to_string(),
            message: "HSI not supported".to_string(),
        }
        .to_string();
        assert_eq!(
            reconciler.resolve("x"),
            QueryOutcome::Unavailable {
                reason: UnavailableReason::Protocol(expected)
            }
        );
    }

    #[test]
    fn test_single_round_trip_per_session() {
        let transport = CountingTransport::serving(vec![
            attr_map("org.fwupd.hsi.Uefi.SecureBoot", 1),
            attr_map("org.fwupd.hsi.Kernel.Lockdown", 5),
        ]);
        let reconciler = QueryReconciler::new(transport, MatchPolicy::NamePrefix);

        for identifier in [
            "org.fwupd.hsi.Uefi.SecureBoot",
            "org.fwupd.hsi.Kernel.Lockdown",
            "org.fwupd.hsi.Missing",
            "org.fwupd.hsi.Uefi.SecureBoot",
        ] {
            reconciler.resolve(identifier);
        }
        reconciler.attributes().unwrap();

        assert_eq!(reconciler.transport().calls(), 1);
    }

    #[test]
    fn test_concurrent_resolutions_share_one_round_trip() {
        let transport = CountingTransport::serving(vec![attr_map("org.fwupd.hsi.Iommu", 1)]);
        let reconciler = Arc::new(QueryReconciler::new(transport, MatchPolicy::NamePrefix));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let reconciler = Arc::clone(&reconciler);
                std::thread::spawn(move || reconciler.resolve("org.fwupd.hsi.Iommu"))
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap().is_found());
        }
        assert_eq!(reconciler.transport().calls(), 1);
    }

    #[test]
    fn test_prepopulated_cache_skips_transport() {
        let mut cache = AttributeCache::with_policy(MatchPolicy::NamePrefix);
        cache.populate(vec![AttributeRecord::new("foo", 13)]);
        let reconciler = QueryReconciler::with_cache(CountingTransport::unreachable(), cache);

        assert_eq!(reconciler.resolve("foobar").status_label(), Some("supported"));
        assert_eq!(reconciler.transport().calls(), 0);
    }
}
