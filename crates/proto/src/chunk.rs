//! Payloads of the `/chunk` endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Request body field holding the region origin on the x axis.
pub const X_OFFSET: &str = "xOffset";
/// Request body field holding the region origin on the z axis.
pub const Z_OFFSET: &str = "zOffset";

/// Southwest corner of the region to sample, in block coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkRequest {
    #[serde(rename = "xOffset")]
    pub x_offset: i64,
    #[serde(rename = "zOffset")]
    pub z_offset: i64,
}

impl ChunkRequest {
    pub const fn new(x_offset: i64, z_offset: i64) -> Self {
        Self { x_offset, z_offset }
    }

    /// Validate a decoded JSON body.
    ///
    /// Both offsets must be present and integral. Whole floating point
    /// values such as `16.0` are accepted.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let x = body.get(X_OFFSET).and_then(integral);
        let z = body.get(Z_OFFSET).and_then(integral);

        match (x, z) {
            (Some(x_offset), Some(z_offset)) => Ok(Self { x_offset, z_offset }),
            (x, z) => {
                let mut fields = Vec::with_capacity(2);
                if x.is_none() {
                    fields.push(X_OFFSET);
                }
                if z.is_none() {
                    fields.push(Z_OFFSET);
                }
                Err(ValidationError { fields })
            }
        }
    }
}

fn integral(value: &Value) -> Option<i64> {
    let number = value.as_number()?;
    if let Some(value) = number.as_i64() {
        return Some(value);
    }

    let value = number.as_f64()?;
    // i64::MAX is not exactly representable, so the upper bound is exclusive.
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.fract() == 0.0 && in_range).then_some(value as i64)
}

/// Fields of a request that are missing or not integers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub fields: Vec<&'static str>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fields.as_slice() {
            [field] => write!(f, "{field} must be an integer"),
            fields => write!(f, "{} must be integers", fields.join(" and ")),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl fmt::Display) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

/// One string per column, each a comma terminated list of block names from
/// the bottom of the world to the top.
pub type ChunkResponse = Vec<String>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_request() {
        assert_eq!(
            ChunkRequest::from_json(&json!({ "xOffset": -32, "zOffset": 48 })),
            Ok(ChunkRequest::new(-32, 48))
        );
        assert_eq!(
            ChunkRequest::from_json(&json!({ "xOffset": 16.0, "zOffset": 0, "extra": true })),
            Ok(ChunkRequest::new(16, 0))
        );
    }

    #[test]
    fn test_invalid_field_is_named() {
        let error = ChunkRequest::from_json(&json!({ "xOffset": "a", "zOffset": 0 })).unwrap_err();
        assert_eq!(error.fields, vec![X_OFFSET]);
        assert_eq!(error.to_string(), "xOffset must be an integer");

        let error = ChunkRequest::from_json(&json!({ "xOffset": 0, "zOffset": 1.5 })).unwrap_err();
        assert_eq!(error.to_string(), "zOffset must be an integer");
    }

    #[test]
    fn test_missing_fields() {
        let error = ChunkRequest::from_json(&json!({})).unwrap_err();
        assert_eq!(error.to_string(), "xOffset and zOffset must be integers");

        let error = ChunkRequest::from_json(&json!([1, 2])).unwrap_err();
        assert_eq!(error.fields.len(), 2);

        let error = ChunkRequest::from_json(&json!({ "xOffset": null, "zOffset": 1e300 })).unwrap_err();
        assert_eq!(error.fields, vec![X_OFFSET, Z_OFFSET]);
    }

    #[test]
    fn test_error_body() {
        let body = serde_json::to_value(ErrorBody::new("Data pack is still loading")).unwrap();
        assert_eq!(body, json!({ "error": "Data pack is still loading" }));
    }
}
