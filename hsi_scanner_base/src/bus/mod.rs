//! # Bus Message Model
//!
//! Typed representation of a reply from the host-management service. Values
//! keep their wire tag so the decoder can match on it exhaustively.

pub mod busctl;
pub mod signature;

pub use signature::Signature;

/// One typed value of a bus message
#[derive(Debug, Clone, PartialEq)]
pub enum BusValue {
    UInt32(u32),
    String(String),
    Array(Vec<BusValue>),
    DictEntry(Box<BusValue>, Box<BusValue>),
    Variant(Box<BusValue>),
    Struct(Vec<BusValue>),
    /// Any basic type the probe does not interpret (bool, bytes, 64-bit ints, paths...)
    Other { signature: String, rendered: String },
}

impl BusValue {
    pub fn string(value: impl Into<String>) -> Self {
        BusValue::String(value.into())
    }

    pub fn variant(inner: BusValue) -> Self {
        BusValue::Variant(Box::new(inner))
    }

    pub fn dict_entry(key: BusValue, value: BusValue) -> Self {
        BusValue::DictEntry(Box::new(key), Box::new(value))
    }

    /// `a{sv}` entry with a string key and a variant-wrapped value
    pub fn property(key: &str, value: BusValue) -> Self {
        Self::dict_entry(BusValue::string(key), Self::variant(value))
    }

    /// D-Bus type code of the outermost tag
    pub fn type_code(&self) -> char {
        match self {
            BusValue::UInt32(_) => 'u',
            BusValue::String(_) => 's',
            BusValue::Array(_) => 'a',
            BusValue::DictEntry(..) => '{',
            BusValue::Variant(_) => 'v',
            BusValue::Struct(_) => '(',
            BusValue::Other { signature, .. } => signature.chars().next().unwrap_or('?'),
        }
    }

    /// Printable form of the value
    pub fn render(&self) -> String {
        match self {
            BusValue::UInt32(v) => v.to_string(),
            BusValue::String(s) => s.clone(),
            BusValue::Array(items) => {
                let parts: Vec<String> = items.iter().map(BusValue::render).collect();
                format!("[{}]", parts.join(", "))
            }
            BusValue::DictEntry(key, value) => format!("{}: {}", key.render(), value.render()),
            BusValue::Variant(inner) => inner.render(),
            BusValue::Struct(fields) => {
                let parts: Vec<String> = fields.iter().map(BusValue::render).collect();
                format!("({})", parts.join(", "))
            }
            BusValue::Other { rendered, .. } => rendered.clone(),
        }
    }
}

/// Whether a reply is a method return or an error reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    MethodReturn,
    Error { name: String, message: String },
}

/// One complete reply message
#[derive(Debug, Clone, PartialEq)]
pub struct BusMessage {
    pub kind: MessageKind,
    pub args: Vec<BusValue>,
}

impl BusMessage {
    pub fn method_return(args: Vec<BusValue>) -> Self {
        Self {
            kind: MessageKind::MethodReturn,
            args,
        }
    }

    pub fn error(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error {
                name: name.into(),
                message: message.into(),
            },
            args: Vec::new(),
        }
    }
}
