//! Shapes shared by several endpoints.
//!
//! The backend is loose about types: ids arrive as numbers or strings, blood
//! types as codes or labels, and lists either bare or wrapped in an
//! envelope. Everything here accepts all of those.

use chrono::{DateTime, NaiveDate, Utc};
use donor_core::dates::{parse_date, parse_datetime};
use donor_core::BloodType;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::ApiError;

/// Keys under which list endpoints wrap their items.
const LIST_KEYS: [&str; 4] = ["items", "data", "results", "value"];

/// An identifier that may be serialized as a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IdValue {
    Number(i64),
    Text(String),
}

impl IdValue {
    /// The id as a non-empty string.
    pub fn into_string(self) -> Option<String> {
        match self {
            IdValue::Number(n) => Some(n.to_string()),
            IdValue::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
        }
    }

    /// The id as an integer, when it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            IdValue::Number(n) => Some(*n),
            IdValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// A related entity given either by name or as a `{ id, name }` object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NamedRef {
    Name(String),
    Object {
        #[serde(default, alias = "_id")]
        id: Option<IdValue>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default, rename = "wilayaId")]
        wilaya_id: Option<IdValue>,
    },
}

impl NamedRef {
    pub fn name(&self) -> Option<String> {
        match self {
            NamedRef::Name(name) => non_blank(Some(name.clone())),
            NamedRef::Object { name, .. } => non_blank(name.clone()),
        }
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            NamedRef::Name(_) => None,
            NamedRef::Object { id, .. } => id.as_ref().and_then(IdValue::as_i64),
        }
    }

    pub fn wilaya_id(&self) -> Option<i64> {
        match self {
            NamedRef::Name(_) => None,
            NamedRef::Object { wilaya_id, .. } => wilaya_id.as_ref().and_then(IdValue::as_i64),
        }
    }
}

/// First id present among the candidates, as a string.
pub(crate) fn first_id(candidates: impl IntoIterator<Item = Option<IdValue>>) -> Option<String> {
    candidates.into_iter().flatten().find_map(IdValue::into_string)
}

/// Interpret a blood type given as a code (`8`, `"8"`) or a label (`"O-"`).
///
/// Unknown values are logged and dropped so one bad field does not discard
/// the whole record.
pub(crate) fn blood_type(value: Option<&Value>) -> Option<BloodType> {
    let raw = value?;
    let parsed = match raw {
        Value::Null => return None,
        Value::Number(n) => n.as_i64().map(BloodType::from_code),
        Value::String(s) if s.trim().is_empty() => return None,
        Value::String(s) => Some(s.parse::<BloodType>()),
        _ => None,
    };

    match parsed {
        Some(Ok(bt)) => Some(bt),
        Some(Err(e)) => {
            warn!("Ignoring blood type: {}", e);
            None
        }
        None => {
            warn!("Ignoring blood type of unexpected shape: {}", raw);
            None
        }
    }
}

pub(crate) fn datetime(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.filter(|s| !s.trim().is_empty()).and_then(parse_datetime)
}

pub(crate) fn date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.filter(|s| !s.trim().is_empty()).and_then(parse_date)
}

pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Unwrap the items of a list response.
///
/// Accepts a bare array or an object carrying the array under one of
/// `items`, `data`, `results` or `value`, nested at most one level
/// (`{ "data": { "items": [...] } }`).
pub fn list_items(body: Value) -> Result<Vec<Value>, ApiError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut obj) => {
            for key in LIST_KEYS {
                match obj.remove(key) {
                    Some(Value::Array(items)) => return Ok(items),
                    Some(inner @ Value::Object(_)) => {
                        if let Ok(items) = list_items(inner) {
                            return Ok(items);
                        }
                    }
                    _ => {}
                }
            }
            Err(ApiError::InvalidResponse(
                "expected a list or a list envelope".to_string(),
            ))
        }
        Value::Null => Ok(Vec::new()),
        other => Err(ApiError::InvalidResponse(format!(
            "expected a list, got {}",
            type_name(&other)
        ))),
    }
}

/// Unwrap a single-object response that may be wrapped as `{ "data": {...} }`.
pub fn single_item(body: Value) -> Value {
    match body {
        Value::Object(mut obj) if obj.len() == 1 && obj.get("data").is_some_and(Value::is_object) => {
            obj.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Decode every element of a list, skipping the ones that do not fit.
///
/// `convert` turns the wire shape into the domain type and may reject a
/// record (missing id, unknown status) by returning an error message.
pub(crate) fn decode_list<D, T, F>(body: Value, kind: &str, convert: F) -> Result<Vec<T>, ApiError>
where
    D: DeserializeOwned,
    F: Fn(D) -> Result<T, String>,
{
    let items = list_items(body)?;
    let total = items.len();

    let decoded: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(idx, item)| {
            let result = serde_json::from_value::<D>(item)
                .map_err(|e| e.to_string())
                .and_then(&convert);
            match result {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Skipping {} #{}: {}", kind, idx, e);
                    None
                }
            }
        })
        .collect();

    if decoded.len() < total {
        warn!("Decoded {}/{} {} records", decoded.len(), total, kind);
    }
    Ok(decoded)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_items_shapes() {
        assert_eq!(list_items(json!([1, 2])).unwrap().len(), 2);
        assert_eq!(list_items(json!({"items": [1]})).unwrap().len(), 1);
        assert_eq!(list_items(json!({"value": [1, 2, 3]})).unwrap().len(), 3);
        assert_eq!(
            list_items(json!({"data": {"items": [1, 2]}, "total": 2}))
                .unwrap()
                .len(),
            2
        );
        assert!(list_items(json!({"count": 0})).is_err());
        assert!(list_items(json!("nope")).is_err());
    }

    #[test]
    fn test_id_value() {
        let n: IdValue = serde_json::from_value(json!(16)).unwrap();
        let s: IdValue = serde_json::from_value(json!("16")).unwrap();
        assert_eq!(n.as_i64(), Some(16));
        assert_eq!(s.as_i64(), Some(16));
        assert_eq!(IdValue::Text("  ".to_string()).into_string(), None);
        assert_eq!(
            first_id([None, Some(IdValue::Text("".into())), Some(IdValue::Number(3))]),
            Some("3".to_string())
        );
    }

    #[test]
    fn test_blood_type_code_or_label() {
        assert_eq!(blood_type(Some(&json!(8))), Some(BloodType::ONegative));
        assert_eq!(blood_type(Some(&json!("AB+"))), Some(BloodType::AbPositive));
        assert_eq!(blood_type(Some(&json!("3"))), Some(BloodType::BPositive));
        assert_eq!(blood_type(Some(&json!(42))), None);
        assert_eq!(blood_type(Some(&json!(null))), None);
        assert_eq!(blood_type(None), None);
    }

    #[test]
    fn test_single_item_unwraps_data() {
        assert_eq!(single_item(json!({"data": {"id": 1}})), json!({"id": 1}));
        assert_eq!(
            single_item(json!({"id": 1, "data": {"x": 1}})),
            json!({"id": 1, "data": {"x": 1}})
        );
    }
}
