//! Parameter keys and per-row key-arity inference
//!
//! A row may start with zero, one, or two purely numeric columns that name
//! the sweep configuration it belongs to. The first non-numeric (or absent)
//! column ends the key; everything from there on is data.

use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::fmt;

use crate::error::{AnalysisError, Result};

/// Maximum number of leading columns that can form a key
pub const MAX_KEY_ARITY: usize = 2;

/// One numeric key component, keeping its original spelling for reports
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamValue {
    // Field order matters: ordering is numeric first, then by spelling.
    value: u64,
    raw: String,
}

impl ParamValue {
    /// Parse a purely numeric field
    ///
    /// Callers are expected to have checked [`is_numeric`]; a field that
    /// passes the test but does not fit in a `u64` is malformed.
    pub fn parse(field: &str, line: u64, column: usize) -> Result<Self> {
        let raw = field.trim();
        let value = raw.parse::<u64>().map_err(|e| {
            AnalysisError::parse(line, column, format!("invalid key value '{}': {}", raw, e))
        })?;
        Ok(Self {
            value,
            raw: raw.to_string(),
        })
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Sweep configuration identifier of arity 0, 1 or 2
///
/// The derived ordering sorts unkeyed before single before pair, then
/// component-wise by [`ParamValue`] ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterKey {
    /// No parameter columns; the group name alone discriminates the row
    Unkeyed,
    Single(ParamValue),
    Pair(ParamValue, ParamValue),
}

impl ParameterKey {
    pub fn arity(&self) -> usize {
        match self {
            ParameterKey::Unkeyed => 0,
            ParameterKey::Single(_) => 1,
            ParameterKey::Pair(_, _) => 2,
        }
    }

    /// Key components in column order
    pub fn components(&self) -> Vec<&ParamValue> {
        match self {
            ParameterKey::Unkeyed => Vec::new(),
            ParameterKey::Single(a) => vec![a],
            ParameterKey::Pair(a, b) => vec![a, b],
        }
    }

    /// Rebuild a key from its emitted components (e.g. a report line)
    pub fn parse_components(components: &[&str]) -> Result<Self> {
        if components.len() > MAX_KEY_ARITY {
            return Err(AnalysisError::parse(
                0,
                MAX_KEY_ARITY,
                format!(
                    "key has {} components, at most {} allowed",
                    components.len(),
                    MAX_KEY_ARITY
                ),
            ));
        }
        for (column, component) in components.iter().enumerate() {
            if !is_numeric(component) {
                return Err(AnalysisError::parse(
                    0,
                    column,
                    format!("key component '{}' is not numeric", component),
                ));
            }
        }
        let (key, consumed) = infer_key(components, 0)?;
        debug_assert_eq!(consumed, components.len());
        Ok(key)
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterKey::Unkeyed => write!(f, "()"),
            ParameterKey::Single(a) => write!(f, "({})", a),
            ParameterKey::Pair(a, b) => write!(f, "({}, {})", a, b),
        }
    }
}

impl Serialize for ParameterKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let components = self.components();
        let mut seq = serializer.serialize_seq(Some(components.len()))?;
        for component in components {
            seq.serialize_element(component.as_str())?;
        }
        seq.end()
    }
}

/// Numeric-string test used for key inference: non-empty, ASCII digits only
pub fn is_numeric(field: &str) -> bool {
    let field = field.trim();
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit())
}

/// Infer the parameter key at the start of a row
///
/// Returns the key and the index of the first data field.
///
/// # Example
/// ```
/// use fifostat::key::{infer_key, ParameterKey};
///
/// let (key, data_start) = infer_key(&["4", "16", "relaxed", "0.5"], 1).unwrap();
/// assert_eq!(key.arity(), 2);
/// assert_eq!(data_start, 2);
///
/// let (key, data_start) = infer_key(&["relaxed", "8", "1200"], 1).unwrap();
/// assert_eq!(key, ParameterKey::Unkeyed);
/// assert_eq!(data_start, 0);
/// ```
pub fn infer_key<S: AsRef<str>>(fields: &[S], line: u64) -> Result<(ParameterKey, usize)> {
    let numeric_prefix = fields
        .iter()
        .take(MAX_KEY_ARITY)
        .take_while(|f| is_numeric(f.as_ref()))
        .count();

    let key = match numeric_prefix {
        0 => ParameterKey::Unkeyed,
        1 => ParameterKey::Single(ParamValue::parse(fields[0].as_ref(), line, 0)?),
        _ => ParameterKey::Pair(
            ParamValue::parse(fields[0].as_ref(), line, 0)?,
            ParamValue::parse(fields[1].as_ref(), line, 1)?,
        ),
    };

    Ok((key, numeric_prefix))
}
