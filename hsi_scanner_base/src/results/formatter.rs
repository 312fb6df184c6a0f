//! Security attribute result codes and their printable labels

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel for a record whose map carried no result property
pub const NO_RESULT: u32 = u32::MAX;

/// Code the service reports when it could not determine a result
pub const RESULT_UNKNOWN: u32 = 0;

/// Known result states of a host security attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u32)]
pub enum SecurityAttrResult {
    Enabled = 1,
    NotEnabled = 2,
    Valid = 3,
    NotValid = 4,
    Locked = 5,
    NotLocked = 6,
    Encrypted = 7,
    NotEncrypted = 8,
    Tainted = 9,
    NotTainted = 10,
    Found = 11,
    NotFound = 12,
    Supported = 13,
    NotSupported = 14,
}

impl SecurityAttrResult {
    pub const ALL: [SecurityAttrResult; 14] = [
        SecurityAttrResult::Enabled,
        SecurityAttrResult::NotEnabled,
        SecurityAttrResult::Valid,
        SecurityAttrResult::NotValid,
        SecurityAttrResult::Locked,
        SecurityAttrResult::NotLocked,
        SecurityAttrResult::Encrypted,
        SecurityAttrResult::NotEncrypted,
        SecurityAttrResult::Tainted,
        SecurityAttrResult::NotTainted,
        SecurityAttrResult::Found,
        SecurityAttrResult::NotFound,
        SecurityAttrResult::Supported,
        SecurityAttrResult::NotSupported,
    ];

    /// Map a wire code; `None` for unknown, sentinel and out-of-range codes
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|result| result.code() == code)
    }

    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SecurityAttrResult::Enabled => "enabled",
            SecurityAttrResult::NotEnabled => "not-enabled",
            SecurityAttrResult::Valid => "valid",
            SecurityAttrResult::NotValid => "not-valid",
            SecurityAttrResult::Locked => "locked",
            SecurityAttrResult::NotLocked => "not-locked",
            SecurityAttrResult::Encrypted => "encrypted",
            SecurityAttrResult::NotEncrypted => "not-encrypted",
            SecurityAttrResult::Tainted => "tainted",
            SecurityAttrResult::NotTainted => "not-tainted",
            SecurityAttrResult::Found => "found",
            SecurityAttrResult::NotFound => "not-found",
            SecurityAttrResult::Supported => "supported",
            SecurityAttrResult::NotSupported => "not-supported",
        }
    }

    /// Reverse lookup from a printable label
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|result| result.as_str() == label)
    }
}

impl fmt::Display for SecurityAttrResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Printable label for a wire code; `None` means the result is unrepresentable
pub fn result_to_label(code: u32) -> Option<&'static str> {
    SecurityAttrResult::from_code(code).map(SecurityAttrResult::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(result_to_label(1), Some("enabled"));
        assert_eq!(result_to_label(2), Some("not-enabled"));
        assert_eq!(result_to_label(3), Some("valid"));
        assert_eq!(result_to_label(10), Some("not-tainted"));
        assert_eq!(result_to_label(14), Some("not-supported"));
    }

    #[test]
    fn test_unrepresentable_codes() {
        assert_eq!(result_to_label(RESULT_UNKNOWN), None);
        assert_eq!(result_to_label(15), None);
        assert_eq!(result_to_label(NO_RESULT), None);
    }

    #[test]
    fn test_label_reverse_lookup_round_trip() {
        for code in 0..=20u32 {
            if let Some(label) = result_to_label(code) {
                let back = SecurityAttrResult::from_label(label).map(SecurityAttrResult::code);
                assert_eq!(back, Some(code), "label '{}' did not map back", label);
            }
        }
        assert_eq!(SecurityAttrResult::from_label("mostly-enabled"), None);
    }

    #[test]
    fn test_serde_uses_labels() {
        for result in SecurityAttrResult::ALL {
            let json = serde_json::to_string(&result).unwrap();
            assert_eq!(json, format!("\"{}\"", result.as_str()));
        }
    }
}
