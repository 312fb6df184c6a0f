//! Diagnostic codes attached to every probe log event
//!
//! Codes are grouped by pipeline stage.

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for error, warning, info and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Stage name derived from the numeric block of the code; `S` codes are
    /// always "success"
    pub fn category(&self) -> &'static str {
        if self.0.starts_with('S') {
            return "success";
        }
        let digits = self.0.trim_start_matches(|c: char| c.is_ascii_alphabetic());
        match digits.get(..2) {
            Some("10") => "system",
            Some("11") => "decode",
            Some("12") => "transport",
            Some("13") => "lookup",
            Some("14") => "config",
            _ => "unknown",
        }
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// CODE CONSTANTS
// ============================================================================

/// Reply decoding
pub mod decode {
    use super::Code;

    pub const UNEXPECTED_REPLY_SHAPE: Code = Code::new("E110");
    pub const NON_STRING_KEY: Code = Code::new("W111");
    pub const MALFORMED_ENTRY: Code = Code::new("W112");
    pub const NON_VARIANT_VALUE: Code = Code::new("W113");
    pub const ARRAY_VALUE_IGNORED: Code = Code::new("D114");
    pub const PARTIAL_RECORD: Code = Code::new("W115");
    pub const EMPTY_MAP: Code = Code::new("D116");
}

/// Bus transport
pub mod transport {
    use super::Code;

    pub const SERVICE_UNREACHABLE: Code = Code::new("E120");
    pub const CALL_FAILED: Code = Code::new("E121");
    pub const REPLY_UNPARSABLE: Code = Code::new("E122");
    pub const HOST_SECURITY_ID_UNAVAILABLE: Code = Code::new("W123");
}

/// Cache lookups
pub mod lookup {
    use super::Code;

    pub const ATTRIBUTE_NOT_FOUND: Code = Code::new("I130");
    pub const NO_RESULT: Code = Code::new("W131");
    pub const UNREPRESENTABLE_RESULT: Code = Code::new("W132");
    pub const CACHE_DUMP: Code = Code::new("D133");
}

/// Configuration loading
pub mod config {
    use super::Code;

    pub const CONFIG_REJECTED: Code = Code::new("E140");
    pub const ENV_OVERRIDE_IGNORED: Code = Code::new("W141");
}

/// Success codes
pub mod success {
    use super::Code;

    pub const CACHE_POPULATED: Code = Code::new("S100");
    pub const ATTRIBUTE_RESOLVED: Code = Code::new("S101");
    pub const REPORT_COMPLETED: Code = Code::new("S102");
}
