//! # HSI Scanner SDK
//!
//! Wires the scanner base to the live bus: whitelisted command execution,
//! transport selection and the command-line surface.

pub mod cli;
pub mod commands;

use hsi_scanner_base::api::{
    HostSecurityTransport, HsiProbe, MatchPolicy, ProbeConfig, ProbeReport,
};
use hsi_scanner_base::strategies::{BusctlTransport, ReplayTransport};
use std::path::Path;

/// Exit status when collection was unavailable
pub const EXIT_UNAVAILABLE: i32 = 2;

/// Where attribute replies come from
pub enum TransportSource<'a> {
    Bus,
    Replay {
        attrs: &'a Path,
        host_security_id: Option<&'a Path>,
    },
}

/// Build the transport selected by `source`
pub fn create_transport(
    config: &ProbeConfig,
    source: TransportSource<'_>,
) -> Box<dyn HostSecurityTransport> {
    match source {
        TransportSource::Bus => Box::new(BusctlTransport::new(
            commands::create_fwupd_command_executor(config.call_timeout()),
            config.bus_target(),
            config.call_timeout(),
        )),
        TransportSource::Replay {
            attrs,
            host_security_id,
        } => {
            let transport = ReplayTransport::new(attrs);
            Box::new(match host_security_id {
                Some(path) => transport.with_host_security_id(path),
                None => transport,
            })
        }
    }
}

/// Apply command-line overrides on top of the loaded configuration
pub fn apply_overrides(config: ProbeConfig, offline: bool, exact_match: bool) -> ProbeConfig {
    let config = if offline {
        config.with_offline_mode(true)
    } else {
        config
    };
    if exact_match {
        config.with_match_policy(MatchPolicy::Exact)
    } else {
        config
    }
}

pub fn create_probe(
    config: &ProbeConfig,
    source: TransportSource<'_>,
) -> HsiProbe<Box<dyn HostSecurityTransport>> {
    HsiProbe::new(create_transport(config, source), config)
}

pub fn exit_code(report: &ProbeReport) -> i32 {
    if report.has_unavailable() {
        EXIT_UNAVAILABLE
    } else {
        0
    }
}
