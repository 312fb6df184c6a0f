//! Command execution configuration for the fwupd probe
//!
//! Provides the whitelisted command executor used by the live transport.

pub mod fwupd;

pub use fwupd::create_fwupd_command_executor;
