//! D-Bus type signature parsing
//!
//! Replies are converted into [`BusValue`](super::BusValue)s by walking the
//! parsed signature, so every container in the reply has a known element type.

use crate::strategies::ProtocolError;
use std::fmt;

/// Nesting limit for arrays and structs combined
const MAX_DEPTH: usize = 64;

/// One complete type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signature {
    UInt32,
    String,
    /// Remaining basic types: `y b n q i x t d h o g`
    Basic(char),
    Array(Box<Signature>),
    Dict(Box<Signature>, Box<Signature>),
    Struct(Vec<Signature>),
    Variant,
}

impl Signature {
    /// Parse a signature holding zero or more complete types
    pub fn parse(text: &str) -> Result<Vec<Signature>, ProtocolError> {
        let mut parser = Parser::new(text);
        let mut types = Vec::new();
        while !parser.at_end() {
            types.push(parser.complete_type(0)?);
        }
        Ok(types)
    }

    /// Parse a signature that must hold exactly one complete type
    pub fn parse_single(text: &str) -> Result<Signature, ProtocolError> {
        let mut types = Self::parse(text)?;
        match types.len() {
            1 => Ok(types.remove(0)),
            0 => Err(ProtocolError::invalid_signature(text, "empty signature")),
            n => Err(ProtocolError::invalid_signature(
                text,
                format!("expected a single complete type, found {}", n),
            )),
        }
    }

    pub fn is_basic(&self) -> bool {
        matches!(self, Signature::UInt32 | Signature::String | Signature::Basic(_))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signature::UInt32 => write!(f, "u"),
            Signature::String => write!(f, "s"),
            Signature::Basic(code) => write!(f, "{}", code),
            Signature::Array(element) => write!(f, "a{}", element),
            Signature::Dict(key, value) => write!(f, "a{{{}{}}}", key, value),
            Signature::Struct(fields) => {
                write!(f, "(")?;
                for field in fields {
                    write!(f, "{}", field)?;
                }
                write!(f, ")")
            }
            Signature::Variant => write!(f, "v"),
        }
    }
}

struct Parser<'a> {
    text: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.chars().collect(),
            pos: 0,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn error(&self, reason: impl Into<String>) -> ProtocolError {
        ProtocolError::invalid_signature(self.text, reason)
    }

    fn complete_type(&mut self, depth: usize) -> Result<Signature, ProtocolError> {
        if depth > MAX_DEPTH {
            return Err(self.error("container nesting too deep"));
        }

        let code = self
            .next()
            .ok_or_else(|| self.error("unexpected end of signature"))?;

        match code {
            'u' => Ok(Signature::UInt32),
            's' => Ok(Signature::String),
            'y' | 'b' | 'n' | 'q' | 'i' | 'x' | 't' | 'd' | 'h' | 'o' | 'g' => {
                Ok(Signature::Basic(code))
            }
            'v' => Ok(Signature::Variant),
            'a' => {
                if self.peek() == Some('{') {
                    self.pos += 1;
                    let key = self.complete_type(depth + 1)?;
                    if !key.is_basic() {
                        return Err(self.error(format!("dict key '{}' is not a basic type", key)));
                    }
                    let value = self.complete_type(depth + 1)?;
                    match self.next() {
                        Some('}') => Ok(Signature::Dict(Box::new(key), Box::new(value))),
                        _ => Err(self.error("dict entry must hold exactly one key and one value")),
                    }
                } else {
                    Ok(Signature::Array(Box::new(self.complete_type(depth + 1)?)))
                }
            }
            '(' => {
                let mut fields = Vec::new();
                loop {
                    match self.peek() {
                        Some(')') => {
                            self.pos += 1;
                            break;
                        }
                        Some(_) => fields.push(self.complete_type(depth + 1)?),
                        None => return Err(self.error("unterminated struct")),
                    }
                }
                if fields.is_empty() {
                    return Err(self.error("empty struct"));
                }
                Ok(Signature::Struct(fields))
            }
            '{' => Err(self.error("dict entry outside of an array")),
            ')' | '}' => Err(self.error(format!("unbalanced '{}'", code))),
            other => Err(self.error(format!("unknown type code '{}'", other))),
        }
    }
}
