//! The closed value model carried inside envelopes, packed as MessagePack.

use crate::error::{DecryptionFailure, EnvelopeError};
use rmpv::Value;

/// A JSON-like value that can travel inside an envelope.
///
/// Integers that fit `i64` are always [`Payload::Int`]; [`Payload::UInt`] only holds
/// values above `i64::MAX`. Maps keep their entry order.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Nil,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Payload>),
    Map(Vec<(Payload, Payload)>),
}

impl Payload {
    /// Packs into MessagePack.
    ///
    /// # Errors
    /// Returns [`EnvelopeError::Serialization`] if the encoder fails.
    pub fn to_packed(&self) -> Result<Vec<u8>, EnvelopeError> {
        let mut buf = Vec::new();
        rmpv::encode::write_value(&mut buf, &Value::from(self.clone())).map_err(|e| {
            EnvelopeError::Serialization {
                message: e.to_string().into(),
                context: Some("MessagePack encoding failed".into()),
            }
        })?;
        Ok(buf)
    }

    /// Unpacks one MessagePack value spanning the whole input.
    ///
    /// # Errors
    /// Returns [`EnvelopeError::Decryption`] with [`DecryptionFailure::InvalidPayload`]
    /// for malformed input, trailing bytes, extension types and non-UTF-8 strings.
    pub fn from_packed(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        let mut cursor = bytes;
        let value = rmpv::decode::read_value(&mut cursor)
            .map_err(|e| EnvelopeError::rejected(DecryptionFailure::InvalidPayload, e.to_string()))?;
        if !cursor.is_empty() {
            return Err(EnvelopeError::rejected(
                DecryptionFailure::InvalidPayload,
                format!("{} trailing bytes after payload", cursor.len()),
            ));
        }
        Self::try_from(value)
            .map_err(|reason| EnvelopeError::rejected(DecryptionFailure::InvalidPayload, reason))
    }

    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Looks up a string key in a map payload.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        let Self::Map(entries) = self else {
            return None;
        };
        entries.iter().find(|(k, _)| k.as_str() == Some(key)).map(|(_, v)| v)
    }
}

impl From<Payload> for Value {
    fn from(payload: Payload) -> Self {
        match payload {
            Payload::Nil => Self::Nil,
            Payload::Bool(b) => Self::Boolean(b),
            Payload::Int(i) => Self::from(i),
            Payload::UInt(u) => Self::from(u),
            Payload::Float(f) => Self::F64(f),
            Payload::String(s) => Self::from(s),
            Payload::Bytes(b) => Self::Binary(b),
            Payload::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Payload::Map(entries) => {
                Self::Map(entries.into_iter().map(|(k, v)| (Self::from(k), Self::from(v))).collect())
            },
        }
    }
}

impl TryFrom<Value> for Payload {
    type Error = &'static str;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Ok(match value {
            Value::Nil => Self::Nil,
            Value::Boolean(b) => Self::Bool(b),
            Value::Integer(i) => match (i.as_i64(), i.as_u64()) {
                (Some(i), _) => Self::Int(i),
                (None, Some(u)) => Self::UInt(u),
                (None, None) => return Err("integer out of range"),
            },
            Value::F32(f) => Self::Float(f64::from(f)),
            Value::F64(f) => Self::Float(f),
            Value::String(s) => Self::String(s.into_str().ok_or("string is not UTF-8")?),
            Value::Binary(b) => Self::Bytes(b),
            Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::try_from).collect::<Result<_, _>>()?)
            },
            Value::Map(entries) => Self::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| -> Result<(Self, Self), Self::Error> {
                        Ok((Self::try_from(k)?, Self::try_from(v)?))
                    })
                    .collect::<Result<_, _>>()?,
            ),
            Value::Ext(..) => return Err("extension types are not supported"),
        })
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Payload {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Payload {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u64> for Payload {
    fn from(u: u64) -> Self {
        i64::try_from(u).map_or(Self::UInt(u), Self::Int)
    }
}

impl From<f64> for Payload {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&[u8]> for Payload {
    fn from(b: &[u8]) -> Self {
        Self::Bytes(b.to_vec())
    }
}

impl From<Vec<Payload>> for Payload {
    fn from(items: Vec<Payload>) -> Self {
        Self::Array(items)
    }
}

impl<T: Into<Payload>> From<Option<T>> for Payload {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}
