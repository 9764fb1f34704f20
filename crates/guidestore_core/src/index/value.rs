//! Index key values extracted from documents.

use crate::error::{CoreError, CoreResult};
use crate::index::traits::IndexKey;
use ciborium::Value;
use serde::Serialize;
use std::fmt;

/// A normalized, totally ordered key stored in a secondary index.
///
/// Keys are derived from the CBOR form of a document field:
///
/// - text is case-folded to lowercase, so unique text indexes are
///   case-insensitive and ordered text scans sort case-insensitively
/// - booleans and integers (including millisecond timestamps) become
///   [`IndexValue::Integer`]
/// - missing fields and nulls become [`IndexValue::Null`], which sorts first
/// - arrays and multi-field indexes become [`IndexValue::Composite`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexValue {
    /// Absent or null field.
    Null,
    /// Integer, boolean or timestamp.
    Integer(i64),
    /// Lowercased text.
    Text(String),
    /// Raw bytes (ids serialize this way).
    Bytes(Vec<u8>),
    /// Ordered tuple of values.
    Composite(Vec<IndexValue>),
}

impl IndexValue {
    /// Creates a text key, folding case.
    pub fn text(value: impl AsRef<str>) -> Self {
        Self::Text(value.as_ref().to_lowercase())
    }

    /// Creates a composite key from its parts.
    #[must_use]
    pub fn composite(parts: Vec<IndexValue>) -> Self {
        Self::Composite(parts)
    }

    /// Builds the key a field holding `value` would produce.
    ///
    /// The value goes through the same CBOR encoding as stored documents,
    /// so a lookup key always matches the key extracted at insert time.
    ///
    /// # Errors
    ///
    /// Returns a codec error if `value` cannot be serialized.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> CoreResult<Self> {
        let mut bytes = Vec::new();
        ciborium::into_writer(value, &mut bytes).map_err(|e| CoreError::codec(e.to_string()))?;
        let cbor: Value =
            ciborium::from_reader(bytes.as_slice()).map_err(|e| CoreError::codec(e.to_string()))?;
        Ok(Self::from_cbor(&cbor))
    }

    /// Converts a CBOR value into an index key.
    #[must_use]
    pub fn from_cbor(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Integer(i64::from(*b)),
            Value::Integer(i) => {
                let wide = i128::from(*i);
                Self::Integer(wide.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
            }
            Value::Text(s) => Self::text(s),
            Value::Bytes(b) => Self::Bytes(b.clone()),
            Value::Tag(_, inner) => Self::from_cbor(inner),
            Value::Array(items) => Self::Composite(items.iter().map(Self::from_cbor).collect()),
            // Floats have no total order and maps are not keys.
            _ => Self::Null,
        }
    }

    /// Extracts the key for `fields` from a decoded document.
    ///
    /// A single field yields its value directly; several fields yield a
    /// [`IndexValue::Composite`] in declaration order. Dotted paths reach
    /// into nested maps.
    #[must_use]
    pub fn extract(document: &Value, fields: &[String]) -> Self {
        match fields {
            [single] => Self::from_cbor(field(document, single).unwrap_or(&Value::Null)),
            many => Self::Composite(
                many.iter()
                    .map(|f| Self::from_cbor(field(document, f).unwrap_or(&Value::Null)))
                    .collect(),
            ),
        }
    }

    /// Returns true for [`IndexValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the integer value, if this is an integer key.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the (lowercased) text, if this is a text key.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

fn field<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = document;
    for segment in path.split('.') {
        let Value::Map(entries) = current else {
            return None;
        };
        current = entries
            .iter()
            .find(|(k, _)| matches!(k, Value::Text(name) if name == segment))
            .map(|(_, v)| v)?;
    }
    Some(current)
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => match uuid::Uuid::from_slice(b) {
                Ok(id) => write!(f, "{id}"),
                Err(_) => {
                    for byte in b {
                        write!(f, "{byte:02x}")?;
                    }
                    Ok(())
                }
            },
            Self::Composite(parts) => {
                write!(f, "(")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{part}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl IndexKey for IndexValue {
    fn describe(&self) -> String {
        self.to_string()
    }
}

impl From<i64> for IndexValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for IndexValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for IndexValue {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}
