//! # Probe Results Module
//!
//! Result labels, per-query outcomes, and the serializable report types.
//!
//! ## Core Types
//! - [`SecurityAttrResult`] - labelled attribute state
//! - [`QueryOutcome`] - result of resolving one identifier
//! - [`ProbeReport`] - one probe session, ready for JSON output

pub mod formatter;
pub mod generator;
pub mod outcome;
pub mod types;

pub use formatter::{result_to_label, SecurityAttrResult, NO_RESULT, RESULT_UNKNOWN};
pub use generator::ResultGenerator;
pub use outcome::{NotFoundReason, QueryOutcome, UnavailableReason};
pub use types::*;
