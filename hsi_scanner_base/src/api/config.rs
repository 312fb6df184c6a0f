//! # Probe Configuration
//!
//! Every field has a default; defaults honour `HSI_OFFLINE_MODE` (`1`, `yes`,
//! `on`, `true` and their negations) and `HSI_CALL_TIMEOUT_MS`, and values
//! from a TOML file take precedence.

use crate::cache::MatchPolicy;
use crate::logging::codes;
use crate::strategies::{BusKind, BusTarget};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// Bus hosting the service (`system` or `user`)
    pub bus: BusKind,

    pub service: String,
    pub object_path: String,
    pub interface: String,

    /// Upper bound for one round-trip
    pub call_timeout_ms: u64,

    pub match_policy: MatchPolicy,

    /// Scanning an image or chroot where the service is not expected to run
    pub offline_mode: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        let target = BusTarget::default();
        Self {
            bus: target.bus,
            service: target.service,
            object_path: target.object_path,
            interface: target.interface,
            call_timeout_ms: env_override("HSI_CALL_TIMEOUT_MS", |v| v.parse().ok())
                .unwrap_or(DEFAULT_CALL_TIMEOUT_MS),
            match_policy: MatchPolicy::default(),
            offline_mode: env_override("HSI_OFFLINE_MODE", parse_flag).unwrap_or(false),
        }
    }
}

/// Read an environment override; a set but unparsable value is logged and ignored
fn env_override<T>(name: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = env::var(name).ok()?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        log_warning!(codes::config::ENV_OVERRIDE_IGNORED, "Ignoring unrecognized environment value",
            "variable" => name, "value" => raw);
    }
    parsed
}

/// Boolean switch as commonly written in the environment
fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

impl ProbeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    pub fn with_bus(mut self, bus: BusKind) -> Self {
        self.bus = bus;
        self
    }

    pub fn with_offline_mode(mut self, offline_mode: bool) -> Self {
        self.offline_mode = offline_mode;
        self
    }

    pub fn with_match_policy(mut self, policy: MatchPolicy) -> Self {
        self.match_policy = policy;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout_ms = timeout.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub fn bus_target(&self) -> BusTarget {
        BusTarget {
            bus: self.bus,
            service: self.service.clone(),
            object_path: self.object_path.clone(),
            interface: self.interface.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let result = self.check();
        if let Err(err) = &result {
            log_error!(codes::config::CONFIG_REJECTED, "Configuration rejected", "error" => err);
        }
        result
    }

    fn check(&self) -> Result<(), ConfigError> {
        for (field, value) in [("service", &self.service), ("interface", &self.interface)] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }
        if !self.object_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "object_path".to_string(),
                reason: format!("'{}' must start with '/'", self.object_path),
            });
        }
        if self.call_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "call_timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid configuration syntax: {reason}")]
    Parse { reason: String },

    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    #[test]
    fn test_default_targets_fwupd() {
        let config = ProbeConfig::default();
        assert_eq!(config.service, "org.freedesktop.fwupd");
        assert_eq!(config.object_path, "/");
        assert_eq!(config.interface, "org.freedesktop.fwupd");
        assert_eq!(config.bus, BusKind::System);
        assert_eq!(config.match_policy, MatchPolicy::NamePrefix);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ProbeConfig::from_toml_str(
            r#"
            bus = "user"
            match_policy = "exact"
            offline_mode = true
            call_timeout_ms = 250
            "#,
        )
        .unwrap();
        assert_eq!(config.bus, BusKind::User);
        assert_eq!(config.match_policy, MatchPolicy::Exact);
        assert!(config.offline_mode);
        assert_eq!(config.call_timeout(), Duration::from_millis(250));
        assert_eq!(config.service, "org.freedesktop.fwupd");
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert_matches!(
            ProbeConfig::from_toml_str(r#"object_path = "relative""#),
            Err(ConfigError::Invalid { field, .. }) if field == "object_path"
        );
        assert_matches!(
            ProbeConfig::from_toml_str(r#"service = """#),
            Err(ConfigError::Invalid { field, .. }) if field == "service"
        );
        assert_matches!(
            ProbeConfig::from_toml_str("call_timeout_ms = 0"),
            Err(ConfigError::Invalid { field, .. }) if field == "call_timeout_ms"
        );
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert_matches!(
            ProbeConfig::from_toml_str("servce = \"x\""),
            Err(ConfigError::Parse { .. })
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "service = \"org.example.Fwupd\"").unwrap();
        writeln!(file, "object_path = \"/org/example\"").unwrap();

        let config = ProbeConfig::from_file(file.path()).unwrap();
        let target = config.bus_target();
        assert_eq!(target.service, "org.example.Fwupd");
        assert_eq!(target.object_path, "/org/example");

        let dir = tempfile::tempdir().unwrap();
        assert_matches!(
            ProbeConfig::from_file(dir.path().join("absent.toml")),
            Err(ConfigError::Read { .. })
        );
    }

    #[test]
    fn test_parse_flag_accepts_common_spellings() {
        for value in ["1", "true", "TRUE", "yes", "Yes", "on"] {
            assert_eq!(parse_flag(value), Some(true), "{}", value);
        }
        for value in ["0", "false", "no", "OFF", ""] {
            assert_eq!(parse_flag(value), Some(false), "{}", value);
        }
        assert_eq!(parse_flag("maybe"), None);
        assert_eq!(parse_flag("2"), None);
    }

    #[test]
    fn test_env_override_reads_and_ignores() {
        env::set_var("HSI_TEST_OVERRIDE_FLAG", " yes ");
        assert_eq!(env_override("HSI_TEST_OVERRIDE_FLAG", parse_flag), Some(true));
        env::set_var("HSI_TEST_OVERRIDE_FLAG", "sometimes");
        assert_eq!(env_override("HSI_TEST_OVERRIDE_FLAG", parse_flag), None);
        env::remove_var("HSI_TEST_OVERRIDE_FLAG");
        assert_eq!(env_override("HSI_TEST_OVERRIDE_FLAG", parse_flag), None);
    }

    #[test]
    fn test_builders() {
        let config = ProbeConfig::default()
            .with_bus(BusKind::User)
            .with_offline_mode(true)
            .with_match_policy(MatchPolicy::Exact)
            .with_call_timeout(Duration::from_secs(2));
        assert_eq!(config.bus_target().bus, BusKind::User);
        assert!(config.offline_mode);
        assert_eq!(config.call_timeout_ms, 2_000);
    }
}
