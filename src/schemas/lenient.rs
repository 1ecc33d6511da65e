//! Deserializers for spreadsheet-backed values, where a number cell may arrive
//! as a JSON number or as a string and an empty cell arrives as `""`.

use serde::de::Error;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub(crate) fn string_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text.trim().to_string()),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(D::Error::custom(format!("expected string or number, got {other}"))),
    }
}

pub(crate) fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(Value::String(text)) => Ok(Some(text)),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected string, got {other}"))),
    }
}

pub(crate) fn optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(value) => integer_from(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected integer, got {value}"))),
    }
}

pub(crate) fn i32_value<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    number_from(&value)
        .filter(|number| number.fract() == 0.0)
        .map(|number| number as i32)
        .ok_or_else(|| D::Error::custom(format!("expected integer, got {value}")))
}

pub(crate) fn f64_value<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    number_from(&value).ok_or_else(|| D::Error::custom(format!("expected number, got {value}")))
}

/// Whole numbers only. Fractions and out-of-range values are rejected rather
/// than truncated.
fn integer_from(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| number.as_f64().and_then(whole)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>().ok().or_else(|| text.parse::<f64>().ok().and_then(whole))
        }
        _ => None,
    }
}

fn whole(number: f64) -> Option<i64> {
    const EXACT_LIMIT: f64 = 9_007_199_254_740_992.0;
    (number.fract() == 0.0 && number.abs() <= EXACT_LIMIT).then_some(number as i64)
}

fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "i32_value")]
        score: i32,
        #[serde(default, deserialize_with = "optional_i64")]
        row: Option<i64>,
    }

    #[test]
    fn integers_accept_numeric_strings() {
        let probe: Probe = serde_json::from_value(json!({"score": "4", "row": 12})).expect("probe");
        assert_eq!(probe.score, 4);
        assert_eq!(probe.row, Some(12));
    }

    #[test]
    fn empty_cells_are_none() {
        let probe: Probe = serde_json::from_value(json!({"score": 4, "row": ""})).expect("probe");
        assert_eq!(probe.row, None);
        let probe: Probe = serde_json::from_value(json!({"score": 4})).expect("probe");
        assert_eq!(probe.row, None);
    }

    #[test]
    fn row_ids_must_be_whole_and_in_range() {
        let probe: Probe = serde_json::from_value(json!({"score": 4, "row": "7.0"})).expect("probe");
        assert_eq!(probe.row, Some(7));
        let probe: Probe = serde_json::from_value(json!({"score": 4, "row": 9.0})).expect("probe");
        assert_eq!(probe.row, Some(9));

        assert!(serde_json::from_value::<Probe>(json!({"score": 4, "row": "7.9"})).is_err());
        assert!(serde_json::from_value::<Probe>(json!({"score": 4, "row": 7.9})).is_err());
        assert!(serde_json::from_value::<Probe>(json!({"score": 4, "row": 1e30})).is_err());
        assert!(serde_json::from_value::<Probe>(json!({"score": 4, "row": "99999999999999999999"})).is_err());
    }

    #[test]
    fn fractional_scores_are_rejected() {
        assert!(serde_json::from_value::<Probe>(json!({"score": 4.5})).is_err());
        assert!(serde_json::from_value::<Probe>(json!({"score": "abc"})).is_err());
    }
}
