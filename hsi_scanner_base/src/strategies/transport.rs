//! Transport collaborators delivering `GetHostSecurityAttrs` replies
//!
//! [`BusctlTransport`] asks the live service through the whitelisted `busctl`
//! client. [`ReplayTransport`] decodes a reply captured earlier with
//! `busctl --json=short call ...`, for offline scanning of images and chroots.

use crate::bus::{busctl, BusMessage, BusValue};
use crate::logging::codes;
use crate::strategies::command_executor::{CommandOutput, SystemCommandExecutor};
use crate::strategies::errors::{ProtocolError, TransportError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bus client program invoked by [`BusctlTransport`]
pub const BUSCTL: &str = "busctl";

/// Method returning the security attribute maps
pub const SECURITY_ATTRS_METHOD: &str = "GetHostSecurityAttrs";

/// Property holding the host security ID string
pub const HOST_SECURITY_ID_PROPERTY: &str = "HostSecurityId";

/// stderr fragments that mean the service was never reached
const UNREACHABLE_MARKERS: &[&str] = &[
    "Failed to connect to bus",
    "ServiceUnknown",
    "NameHasNoOwner",
    "was not provided by any .service files",
    "Could not activate remote peer",
    "Connection refused",
    "No such file or directory",
];

/// One round-trip to the host-management service
pub trait HostSecurityTransport: Send + Sync {
    /// Identifier used in logs and reports
    fn transport_id(&self) -> &str;

    /// Invoke the security attribute method and return its reply
    fn fetch_security_attrs(&self) -> Result<BusMessage, TransportError>;

    /// Read the host security ID property (e.g. `HSI:2! (v1.9.5)`)
    fn fetch_host_security_id(&self) -> Result<String, TransportError>;
}

impl<T: HostSecurityTransport + ?Sized> HostSecurityTransport for Box<T> {
    fn transport_id(&self) -> &str {
        (**self).transport_id()
    }

    fn fetch_security_attrs(&self) -> Result<BusMessage, TransportError> {
        (**self).fetch_security_attrs()
    }

    fn fetch_host_security_id(&self) -> Result<String, TransportError> {
        (**self).fetch_host_security_id()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusKind {
    #[default]
    System,
    User,
}

impl BusKind {
    fn busctl_flag(self) -> &'static str {
        match self {
            BusKind::System => "--system",
            BusKind::User => "--user",
        }
    }
}

/// Address of the service object queried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusTarget {
    pub bus: BusKind,
    pub service: String,
    pub object_path: String,
    pub interface: String,
}

impl Default for BusTarget {
    fn default() -> Self {
        Self {
            bus: BusKind::System,
            service: "org.freedesktop.fwupd".to_string(),
            object_path: "/".to_string(),
            interface: "org.freedesktop.fwupd".to_string(),
        }
    }
}

/// Live transport through `busctl --json=short`
pub struct BusctlTransport {
    executor: SystemCommandExecutor,
    target: BusTarget,
    timeout: Duration,
}

impl BusctlTransport {
    pub fn new(executor: SystemCommandExecutor, target: BusTarget, timeout: Duration) -> Self {
        Self {
            executor,
            target,
            timeout,
        }
    }

    fn run(&self, verb: &str, member: &str) -> Result<String, TransportError> {
        let args = [
            "--json=short",
            self.target.bus.busctl_flag(),
            verb,
            self.target.service.as_str(),
            self.target.object_path.as_str(),
            self.target.interface.as_str(),
            member,
        ];

        let output = self
            .executor
            .execute(BUSCTL, &args, Some(self.timeout))
            .map_err(|e| TransportError::from_command(&self.target.service, e))?;

        if output.succeeded() {
            Ok(output.stdout)
        } else {
            Err(classify_failure(&self.target.service, member, &output))
        }
    }
}

/// Sort a non-zero busctl exit into unreachable vs failed call
fn classify_failure(service: &str, member: &str, output: &CommandOutput) -> TransportError {
    let stderr = output.stderr.trim();
    let reason = if stderr.is_empty() {
        format!("busctl exited with status {}", output.exit_code)
    } else {
        stderr.to_string()
    };

    if UNREACHABLE_MARKERS.iter().any(|marker| stderr.contains(marker)) {
        TransportError::unavailable(service, reason)
    } else {
        TransportError::CallFailed {
            method: member.to_string(),
            reason,
        }
    }
}

impl HostSecurityTransport for BusctlTransport {
    fn transport_id(&self) -> &str {
        "busctl"
    }

    fn fetch_security_attrs(&self) -> Result<BusMessage, TransportError> {
        let stdout = self.run("call", SECURITY_ATTRS_METHOD)?;
        Ok(busctl::parse_call_reply(&stdout)?)
    }

    fn fetch_host_security_id(&self) -> Result<String, TransportError> {
        let stdout = self.run("get-property", HOST_SECURITY_ID_PROPERTY)?;
        string_property(busctl::parse_property_reply(&stdout)?)
    }
}

fn string_property(value: BusValue) -> Result<String, TransportError> {
    match value {
        BusValue::String(s) => Ok(s),
        BusValue::Variant(inner) => string_property(*inner),
        other => Err(ProtocolError::UnexpectedShape {
            location: HOST_SECURITY_ID_PROPERTY.to_string(),
            expected: "string".to_string(),
            found: other.type_code().to_string(),
        }
        .into()),
    }
}

/// Offline transport reading captured busctl replies from disk
pub struct ReplayTransport {
    attrs_path: PathBuf,
    host_security_id_path: Option<PathBuf>,
}

impl ReplayTransport {
    pub fn new(attrs_path: impl Into<PathBuf>) -> Self {
        Self {
            attrs_path: attrs_path.into(),
            host_security_id_path: None,
        }
    }

    /// Also replay a captured `get-property HostSecurityId` reply
    pub fn with_host_security_id(mut self, path: impl Into<PathBuf>) -> Self {
        self.host_security_id_path = Some(path.into());
        self
    }

    fn read(path: &Path) -> Result<String, TransportError> {
        std::fs::read_to_string(path).map_err(|e| {
            log_error!(codes::transport::SERVICE_UNREACHABLE, "Cannot read captured reply",
                "path" => path.display(), "error" => e);
            TransportError::unavailable(
                &format!("replay:{}", path.display()),
                format!("cannot read captured reply: {}", e),
            )
        })
    }
}

impl HostSecurityTransport for ReplayTransport {
    fn transport_id(&self) -> &str {
        "replay"
    }

    fn fetch_security_attrs(&self) -> Result<BusMessage, TransportError> {
        let text = Self::read(&self.attrs_path)?;
        Ok(busctl::parse_call_reply(&text)?)
    }

    fn fetch_host_security_id(&self) -> Result<String, TransportError> {
        match &self.host_security_id_path {
            Some(path) => string_property(busctl::parse_property_reply(&Self::read(path)?)?),
            None => Err(TransportError::unavailable(
                &format!("replay:{}", self.attrs_path.display()),
                "no captured HostSecurityId reply",
            )),
        }
    }
}
