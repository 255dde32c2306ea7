//! Values stored under a configuration key.

use std::collections::BTreeMap;
use std::fmt;

/// A single value read from a key.
///
/// Only the text variants are interpreted by callers; everything else is
/// carried through opaquely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// `REG_SZ`
    String(String),
    /// `REG_EXPAND_SZ`, unexpanded.
    ExpandString(String),
    /// `REG_MULTI_SZ`
    MultiString(Vec<String>),
    /// `REG_DWORD`
    Dword(u32),
    /// `REG_QWORD`
    Qword(u64),
    /// `REG_BINARY` and any type without a dedicated variant.
    Binary(Vec<u8>),
    /// `REG_NONE`
    None,
}

impl Value {
    /// The text content, for string-typed values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::ExpandString(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric content, for integer-typed values.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Dword(n) => Some(u64::from(*n)),
            Value::Qword(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        self.as_str().is_some()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) | Value::ExpandString(s) => f.write_str(s),
            Value::MultiString(items) => write!(f, "{}", items.join(", ")),
            Value::Dword(n) => write!(f, "{}", n),
            Value::Qword(n) => write!(f, "{}", n),
            Value::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Value::None => f.write_str("<none>"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Dword(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Qword(n)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Binary(bytes)
    }
}

/// All values directly under one key, by name.
pub type ValueMap = BTreeMap<String, Value>;
