//! Typed views over registry records.
//!
//! The registry owns the schema; these structs deserialize the fields the
//! portal cares about and tolerate anything else. Ids are always
//! string-coerced, since some registry tables hand back numeric ids.

mod business;
mod contact;
mod property;

pub use business::{Business, SafeBusiness};
pub use contact::{Contact, SafeContact};
pub use property::{Property, SafeProperty};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserializes an id that may arrive as a JSON string or number.
pub(crate) fn string_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Deserializes a possibly-absent list of ids, string-coercing each entry
/// and dropping anything empty or non-scalar.
pub(crate) fn string_id_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(items)) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .iter()
        .filter_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect())
}
