use super::SensorFrame;
use serde_json::{Map, Value};
use thiserror::Error;

/// Per-message decode failures. None of these are fatal to the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("field {key:?} is not an integer: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("expected {expected} values, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}

impl DecodeError {
    /// Short label used for counters and log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedPayload(_) => "malformed_payload",
            Self::InvalidValue { .. } => "invalid_value",
            Self::ShapeMismatch { .. } => "shape_mismatch",
        }
    }
}

/// Turns telemetry payloads into fixed-shape grids.
///
/// The payload is a JSON object; its values, taken in document order, are
/// the readings. Key names are ignored apart from error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDecoder {
    width: usize,
    height: usize,
}

impl FrameDecoder {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn expected_len(&self) -> usize {
        self.width * self.height
    }

    pub fn decode(&self, payload: &[u8]) -> Result<SensorFrame, DecodeError> {
        let values = extract_values(payload)?;
        let expected = self.expected_len();
        let actual = values.len();
        if actual != expected {
            return Err(DecodeError::ShapeMismatch { expected, actual });
        }
        // Only a zero-sized grid can still fail here.
        SensorFrame::from_values(values, self.width, self.height)
            .ok_or(DecodeError::ShapeMismatch { expected, actual })
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new(10, 10)
    }
}

/// Parse the payload and coerce every value, in order, without a shape check.
pub fn extract_values(payload: &[u8]) -> Result<Vec<i64>, DecodeError> {
    let parsed: Value = serde_json::from_slice(payload)
        .map_err(|e| DecodeError::MalformedPayload(e.to_string()))?;

    let map: Map<String, Value> = match parsed {
        Value::Object(map) => map,
        other => {
            return Err(DecodeError::MalformedPayload(format!(
                "expected a JSON object, found {}",
                json_type_name(&other)
            )))
        }
    };

    map.iter()
        .map(|(key, value)| {
            coerce_integer(value).map_err(|reason| DecodeError::InvalidValue {
                key: key.clone(),
                reason,
            })
        })
        .collect()
}

fn coerce_integer(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            if n.is_u64() {
                return Err(format!("{} is out of range", n));
            }
            let f = n.as_f64().ok_or_else(|| format!("{} is not representable", n))?;
            float_to_integer(f)
        }
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("{:?} is not an integer literal", s)),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(format!("unsupported {}", json_type_name(other))),
    }
}

// Truncates toward zero.
fn float_to_integer(f: f64) -> Result<i64, String> {
    if !f.is_finite() {
        return Err(format!("{} is not finite", f));
    }
    let truncated = f.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(format!("{} is out of range", f));
    }
    Ok(truncated as i64)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coercion_follows_int_semantics() {
        assert_eq!(coerce_integer(&serde_json::json!(7)), Ok(7));
        assert_eq!(coerce_integer(&serde_json::json!(-3.9)), Ok(-3));
        assert_eq!(coerce_integer(&serde_json::json!(" 42 ")), Ok(42));
        assert_eq!(coerce_integer(&serde_json::json!(true)), Ok(1));
        assert!(coerce_integer(&serde_json::json!("4.5")).is_err());
        assert!(coerce_integer(&serde_json::json!(null)).is_err());
        assert!(coerce_integer(&serde_json::json!([1])).is_err());
        assert!(coerce_integer(&serde_json::json!(u64::MAX)).is_err());
    }

    #[test]
    fn test_keeps_document_order() {
        let values = extract_values(br#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_non_object_is_malformed() {
        let err = extract_values(b"[1, 2, 3]").unwrap_err();
        assert_eq!(err.kind(), "malformed_payload");
    }
}
