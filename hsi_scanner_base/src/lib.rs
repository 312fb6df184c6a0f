//! # HSI Scanner Base
//!
//! Decodes the fwupd host security attribute reply, caches it for the probe
//! session and answers per-attribute queries with labelled results.

#[macro_use]
pub mod logging;

pub mod api;
pub mod bus;
pub mod cache;
pub mod decoder;
pub mod reconciler;
pub mod results;
pub mod strategies;

// Convenience re-exports
pub use api::*;

pub mod prelude {
    pub use crate::api::{
        AttributeListing, ConfigError, HsiProbe, MatchPolicy, ProbeConfig, ProbeReport,
        QueryOutcome, SecurityAttrResult,
    };

    pub use crate::strategies::{
        BusTarget, BusctlTransport, HostSecurityTransport, ReplayTransport, SystemCommandExecutor,
        TransportError,
    };

    pub use crate::cache::AttributeCache;
    pub use crate::decoder::{decode, AttributeRecord};
    pub use crate::reconciler::QueryReconciler;
    pub use crate::results::{result_to_label, ResultGenerator};
}
