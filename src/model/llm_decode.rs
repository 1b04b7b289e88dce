use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::model::narrative::NarrativeResponse;

/// Why a generated payload was refused.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("narrative is missing decision option {0}")]
    MissingOption(&'static str),
}

/// Decode sanitized narrator output into a typed payload.
pub fn decode_narrative(json: &str) -> Result<NarrativeResponse, ValidationError> {
    Ok(serde_json::from_str(json)?)
}

/// Narrators emit `50`, `50.0` or `"50"` for the same thing.
fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace([',', '_'], "").parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

pub(crate) fn lenient_stat<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => number_from_value(&v)
            .map(|n| Some(n.round() as i64))
            .ok_or_else(|| de::Error::custom(format!("stat is not numeric: {v}"))),
    }
}

pub(crate) fn lenient_month<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    number_from_value(&value)
        .filter(|n| *n >= 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n.round() as u32)
        .ok_or_else(|| de::Error::custom(format!("month is not a non-negative number: {value}")))
}
