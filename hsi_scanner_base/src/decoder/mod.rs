//! # Security Attribute Decoder
//!
//! Walks a `GetHostSecurityAttrs` reply (`aa{sv}`: an array of property maps)
//! and yields one [`AttributeRecord`] per map.
//!
//! The whole outer shape is validated before the first record is produced, so a
//! shape failure yields no records at all. Inside a map, malformed entries are
//! logged and skipped; one bad property never voids the other attributes.

use crate::bus::{BusMessage, BusValue, MessageKind};
use crate::logging::codes;
use crate::results::formatter::NO_RESULT;
use crate::strategies::ProtocolError;
use serde::Serialize;
use std::iter::FusedIterator;

/// Property holding the attribute's display name
pub const NAME_FIELD: &str = "AppstreamId";

/// Property holding the attribute's numeric result
pub const RESULT_FIELD: &str = "HsiResult";

/// One decoded security attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeRecord {
    pub name: String,
    pub result_code: u32,
}

impl AttributeRecord {
    pub fn new(name: impl Into<String>, result_code: u32) -> Self {
        Self {
            name: name.into(),
            result_code,
        }
    }

    /// False when the map carried no result property
    pub fn has_result(&self) -> bool {
        self.result_code != NO_RESULT
    }

    /// False when the map carried no name property
    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Validate the reply shape and return a single-pass iterator over its records
pub fn decode(message: &BusMessage) -> Result<AttributeRecords<'_>, ProtocolError> {
    if let MessageKind::Error { name, message } = &message.kind {
        return Err(ProtocolError::ErrorReply {
            name: name.clone(),
            message: message.clone(),
        });
    }

    let first = message.args.first().ok_or(ProtocolError::MissingArgument)?;
    let maps = match first {
        BusValue::Array(maps) => maps.as_slice(),
        other => return Err(shape_error("reply argument 0", "array of maps", other)),
    };

    for (index, map) in maps.iter().enumerate() {
        if !matches!(map, BusValue::Array(_)) {
            return Err(shape_error(
                &format!("attribute map {}", index),
                "array of dict entries",
                map,
            ));
        }
    }

    Ok(AttributeRecords {
        maps: maps.iter().enumerate(),
    })
}

fn shape_error(location: &str, expected: &str, found: &BusValue) -> ProtocolError {
    let err = ProtocolError::UnexpectedShape {
        location: location.to_string(),
        expected: expected.to_string(),
        found: found.type_code().to_string(),
    };
    log_error!(codes::decode::UNEXPECTED_REPLY_SHAPE, &err.to_string());
    err
}

/// Records of one reply, in map order. Maps with neither a name nor a result
/// are skipped.
#[derive(Debug)]
pub struct AttributeRecords<'a> {
    maps: std::iter::Enumerate<std::slice::Iter<'a, BusValue>>,
}

impl Iterator for AttributeRecords<'_> {
    type Item = AttributeRecord;

    fn next(&mut self) -> Option<AttributeRecord> {
        for (index, map) in self.maps.by_ref() {
            // Shape was checked in decode()
            if let BusValue::Array(entries) = map {
                if let Some(record) = decode_map(index, entries) {
                    return Some(record);
                }
            }
        }
        None
    }
}

impl FusedIterator for AttributeRecords<'_> {}

fn decode_map(index: usize, entries: &[BusValue]) -> Option<AttributeRecord> {
    let mut name: Option<String> = None;
    let mut result_code: Option<u32> = None;

    for (position, entry) in entries.iter().enumerate() {
        let (key, value) = match entry {
            BusValue::DictEntry(key, value) => (key.as_ref(), value.as_ref()),
            other => {
                log_warning!(codes::decode::MALFORMED_ENTRY, "Skipping non dict-entry element",
                    "map" => index, "entry" => position, "type" => other.type_code());
                continue;
            }
        };

        let key = match key {
            BusValue::String(key) => key.as_str(),
            other => {
                log_warning!(codes::decode::NON_STRING_KEY, "Skipping entry with non-string key",
                    "map" => index, "entry" => position, "type" => other.type_code());
                continue;
            }
        };

        let inner = match value {
            BusValue::Variant(inner) => inner.as_ref(),
            // Undecodable variant, already reported by the codec
            BusValue::Other { signature, .. } if signature == "v" => continue,
            other => {
                log_warning!(codes::decode::NON_VARIANT_VALUE, "Skipping entry whose value is not a variant",
                    "map" => index, "key" => key, "type" => other.type_code());
                continue;
            }
        };

        match inner {
            // Array-valued properties (GUIDs, flags lists) are recognized but not interpreted
            BusValue::Array(_) => {
                log_debug!(codes::decode::ARRAY_VALUE_IGNORED, "Array property not interpreted",
                    "map" => index, "key" => key);
            }
            BusValue::UInt32(code) if key == RESULT_FIELD => result_code = Some(*code),
            BusValue::UInt32(_)
            | BusValue::String(_)
            | BusValue::DictEntry(..)
            | BusValue::Variant(_)
            | BusValue::Struct(_)
            | BusValue::Other { .. } => {
                if key == NAME_FIELD {
                    name = Some(inner.render());
                }
            }
        }
    }

    match (name, result_code) {
        (None, None) => {
            log_debug!(codes::decode::EMPTY_MAP, "Map carried neither name nor result", "map" => index);
            None
        }
        (name, result_code) => {
            if name.is_none() || result_code.is_none() {
                log_warning!(codes::decode::PARTIAL_RECORD, "Emitting partial attribute record",
                    "map" => index,
                    "has_name" => name.is_some(),
                    "has_result" => result_code.is_some());
            }
            Some(AttributeRecord {
                name: name.unwrap_or_default(),
                result_code: result_code.unwrap_or(NO_RESULT),
            })
        }
    }
}
