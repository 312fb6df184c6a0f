//! busctl JSON reply codec
//!
//! `busctl --json=short call ...` prints `{"type":"<signature>","data":[<arg>...]}`
//! with one JSON value per complete type of the signature. `get-property`
//! prints `{"type":"<signature>","data":<value>}`. Dicts are JSON objects keyed
//! by the stringified key and variants are nested `{"type","data"}` objects.

use super::{BusMessage, BusValue, Signature};
use crate::logging::codes;
use crate::strategies::ProtocolError;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct TypedJson {
    #[serde(rename = "type")]
    signature: String,
    data: Value,
}

fn parse_typed(text: &str) -> Result<TypedJson, ProtocolError> {
    serde_json::from_str(text.trim()).map_err(|e| ProtocolError::InvalidJson {
        reason: e.to_string(),
    })
}

/// Parse the output of `busctl --json=short call`
pub fn parse_call_reply(text: &str) -> Result<BusMessage, ProtocolError> {
    let reply = parse_typed(text)?;
    let types = Signature::parse(&reply.signature)?;

    let data = match reply.data {
        Value::Array(items) => items,
        other => {
            return Err(ProtocolError::type_mismatch(
                &reply.signature,
                "array of arguments",
                &other,
            ))
        }
    };

    if data.len() != types.len() {
        return Err(ProtocolError::ArgumentCountMismatch {
            signature: reply.signature,
            declared: types.len(),
            found: data.len(),
        });
    }

    let args = types
        .iter()
        .zip(data.iter())
        .map(|(sig, json)| value_from_json(sig, json))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BusMessage::method_return(args))
}

/// Parse the output of `busctl --json=short get-property` for one property
pub fn parse_property_reply(text: &str) -> Result<BusValue, ProtocolError> {
    let reply = parse_typed(text)?;
    let sig = Signature::parse_single(&reply.signature)?;
    value_from_json(&sig, &reply.data)
}

/// Convert one JSON value following its signature
pub fn value_from_json(sig: &Signature, json: &Value) -> Result<BusValue, ProtocolError> {
    match sig {
        Signature::UInt32 => json
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(BusValue::UInt32)
            .ok_or_else(|| {
                ProtocolError::type_mismatch(&sig.to_string(), "unsigned 32-bit integer", json)
            }),
        Signature::String => json
            .as_str()
            .map(BusValue::string)
            .ok_or_else(|| ProtocolError::type_mismatch(&sig.to_string(), "string", json)),
        Signature::Basic(code) => basic_from_json(*code, json),
        Signature::Array(element) => {
            let items = json
                .as_array()
                .ok_or_else(|| ProtocolError::type_mismatch(&sig.to_string(), "array", json))?;
            items
                .iter()
                .map(|item| value_from_json(element, item))
                .collect::<Result<Vec<_>, _>>()
                .map(BusValue::Array)
        }
        Signature::Dict(key_sig, value_sig) => {
            let object = json
                .as_object()
                .ok_or_else(|| ProtocolError::type_mismatch(&sig.to_string(), "object", json))?;
            let mut entries = Vec::with_capacity(object.len());
            for (key, value) in object {
                let key = key_from_str(key_sig, key)?;
                let value = value_from_json(value_sig, value)?;
                entries.push(BusValue::dict_entry(key, value));
            }
            Ok(BusValue::Array(entries))
        }
        Signature::Struct(fields) => {
            let items = json
                .as_array()
                .filter(|items| items.len() == fields.len())
                .ok_or_else(|| {
                    ProtocolError::type_mismatch(
                        &sig.to_string(),
                        &format!("array of {} struct fields", fields.len()),
                        json,
                    )
                })?;
            fields
                .iter()
                .zip(items.iter())
                .map(|(field, item)| value_from_json(field, item))
                .collect::<Result<Vec<_>, _>>()
                .map(BusValue::Struct)
        }
        Signature::Variant => Ok(variant_from_json(json)),
    }
}

/// A variant that does not match its own declared type is kept as an
/// uninterpreted `v` value instead of failing the whole reply
fn variant_from_json(json: &Value) -> BusValue {
    let decoded = serde_json::from_value::<TypedJson>(json.clone())
        .map_err(|_| ProtocolError::type_mismatch("v", "object with 'type' and 'data'", json))
        .and_then(|typed| {
            let inner_sig = Signature::parse_single(&typed.signature)?;
            value_from_json(&inner_sig, &typed.data)
        });

    match decoded {
        Ok(inner) => BusValue::variant(inner),
        Err(err) => {
            log_warning!(codes::decode::MALFORMED_ENTRY, "Keeping undecodable variant uninterpreted",
                "error" => err);
            BusValue::Other {
                signature: Signature::Variant.to_string(),
                rendered: json.to_string(),
            }
        }
    }
}

fn basic_from_json(code: char, json: &Value) -> Result<BusValue, ProtocolError> {
    let signature = code.to_string();
    let valid = match code {
        'b' => json.is_boolean(),
        'd' => json.is_number(),
        'o' | 'g' => json.is_string(),
        'x' | 'n' | 'i' => json.is_i64() || json.is_u64(),
        _ => json.is_u64(),
    };
    if !valid {
        return Err(ProtocolError::type_mismatch(
            &signature,
            "basic value of the declared type",
            json,
        ));
    }

    let rendered = match json {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    Ok(BusValue::Other {
        signature,
        rendered,
    })
}

/// JSON object keys are always strings; re-type them from the key signature
fn key_from_str(sig: &Signature, key: &str) -> Result<BusValue, ProtocolError> {
    match sig {
        Signature::String => Ok(BusValue::string(key)),
        Signature::UInt32 => key.parse::<u32>().map(BusValue::UInt32).map_err(|_| {
            ProtocolError::TypeMismatch {
                signature: sig.to_string(),
                expected: "unsigned 32-bit dict key".to_string(),
                found: key.to_string(),
            }
        }),
        other => Ok(BusValue::Other {
            signature: other.to_string(),
            rendered: key.to_string(),
        }),
    }
}
