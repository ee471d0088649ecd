use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::ExtractError;
use crate::value::Value;

/// Map key holding the sample timestamp in epoch milliseconds.
pub const TIMESTAMP_KEY: &str = "t";

/// Map key holding the per-channel readings.
pub const READINGS_KEY: &str = "w";

/// One timestamped set of channel readings.
///
/// `readings[i]` belongs to channel `i`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp_ms: u64,
    pub readings: Vec<f64>,
}

impl Sample {
    pub fn new(timestamp_ms: u64, readings: Vec<f64>) -> Self {
        Self {
            timestamp_ms,
            readings,
        }
    }
}

impl From<&Sample> for Value {
    fn from(sample: &Sample) -> Self {
        [
            (TIMESTAMP_KEY.to_string(), Value::from(sample.timestamp_ms)),
            (READINGS_KEY.to_string(), Value::from(sample.readings.clone())),
        ]
        .into_iter()
        .collect()
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Extract a sample, stamping it with the current time when `"t"` is
/// missing or not a non-negative integer.
pub fn extract_sample(value: &Value) -> Result<Sample, ExtractError> {
    extract_sample_at(value, now_millis())
}

/// Extract a sample, using `fallback_ms` when `"t"` is missing or unusable.
///
/// Fails when the value is not a map, when `"w"` is not an array, or when
/// any reading is not a number. A missing `"w"` yields no readings.
pub fn extract_sample_at(value: &Value, fallback_ms: u64) -> Result<Sample, ExtractError> {
    let map = value.as_map().ok_or(ExtractError::NotAMap {
        found: value.type_name(),
    })?;

    let timestamp_ms = map
        .get(TIMESTAMP_KEY)
        .and_then(Value::as_u64)
        .unwrap_or(fallback_ms);

    let readings = match map.get(READINGS_KEY) {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_f64().ok_or(ExtractError::NonNumericReading {
                    index,
                    found: item.type_name(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(ExtractError::ReadingsNotArray {
                found: other.type_name(),
            })
        }
    };

    Ok(Sample {
        timestamp_ms,
        readings,
    })
}
