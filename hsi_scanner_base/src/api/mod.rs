//! # Public API for the HSI scanner
//!
//! High-level entry points: [`ProbeConfig`] and the [`HsiProbe`] session facade.

pub mod config;
pub mod probe;

pub use config::{ConfigError, ProbeConfig, DEFAULT_CALL_TIMEOUT_MS};
pub use probe::{AttributeListing, HsiProbe};

pub use crate::cache::MatchPolicy;
pub use crate::results::{
    CollectedItem, CollectionFlag, HostContext, HostSecurityLevel, ItemStatus, NotFoundReason,
    ObjectResult, ProbeReport, QueryOutcome, ReportError, ReportSummary, SecurityAttrResult,
    UnavailableReason,
};
pub use crate::strategies::{
    BusKind, BusTarget, BusctlTransport, CommandError, CommandOutput, HostSecurityTransport,
    ReplayTransport, SystemCommandExecutor, TransportError,
};
