// src/strategies/mod.rs
//! Collection strategies: how replies are obtained from the host-management service
//!
//! - [`HostSecurityTransport`] - one round-trip to the service
//! - [`SystemCommandExecutor`] - whitelisted, time-bounded command execution
//! - Error types shared by transports and the decoder

pub mod command_executor;
pub mod errors;
pub mod transport;

pub use command_executor::{CommandError, CommandOutput, SystemCommandExecutor};
pub use errors::{ProtocolError, TransportError};
pub use transport::{
    BusKind, BusTarget, BusctlTransport, HostSecurityTransport, ReplayTransport, BUSCTL,
};
