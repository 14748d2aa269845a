//! Lenient decoding of persisted values
//!
//! Storage written by older popup builds is not uniform: booleans may be stored as the
//! strings `"true"`/`"false"`, ports as numbers or strings, and a rule's `host` may be
//! missing or `null`. These helpers accept every observed shape and never fail on them.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Interpret a stored value as a boolean
///
/// Accepts JSON booleans, the strings `"true"`/`"false"` (surrounding whitespace ignored)
/// and integers (non-zero is `true`). Returns `None` for anything else.
pub fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

/// Interpret a stored value as a string
///
/// Strings are returned as-is, numbers in their decimal form. `null`, booleans and
/// structured values yield `None`.
pub fn lenient_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Deserialize a boolean that may have been stored as a string
///
/// Unrecognised values deserialize as `false`, matching how the popup treats them.
///
/// # Example
/// ```rust,ignore
/// #[derive(Deserialize)]
/// struct Row {
///     #[serde(default, deserialize_with = "deserialize_lenient_bool")]
///     enabled: bool,
/// }
/// ```
pub fn deserialize_lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(lenient_bool(&value).unwrap_or(false))
}

/// Deserialize a string where `null` means empty
pub fn deserialize_nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
