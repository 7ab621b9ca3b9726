use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// Deserialize any JSON scalar as an optional string; numbers and booleans are stringified,
/// `null` and nested structures become `None`.
pub(crate) fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(scalar_to_string))
}

/// Deserialize an optional array, keeping the elements that fit `T` and dropping the rest.
///
/// A field that is present but not an array is treated as missing.
pub(crate) fn lenient_vec<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let items = match value {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => return Ok(None),
        Some(other) => {
            warn!("expected an array, found {other}; ignoring field");
            return Ok(None);
        }
    };

    let kept = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!("dropping malformed array element, error({err})");
                None
            }
        })
        .collect();
    Ok(Some(kept))
}

pub(crate) fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
