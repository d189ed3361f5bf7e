//! JSON responses and their conversion to [`tiny_http`] responses.

use crate::chunk::ErrorBody;
use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use std::io::Cursor;
use tiny_http::{Header, StatusCode};

pub const OK: StatusCode = StatusCode(200);
pub const BAD_REQUEST: StatusCode = StatusCode(400);
pub const NOT_FOUND: StatusCode = StatusCode(404);
pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
pub const PAYLOAD_TOO_LARGE: StatusCode = StatusCode(413);
pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503);

/// Body used when an error body itself cannot be serialized.
const FALLBACK_ERROR: &[u8] = br#"{"error":"Internal server error"}"#;

/// A status code with a serialized JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl JsonResponse {
    /// Serialize `value` as the response body.
    pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Result<Self, serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        Ok(Self {
            status,
            body: Bytes::from(body),
        })
    }

    /// A `{ "error": message }` response.
    pub fn error(status: StatusCode, message: impl fmt::Display) -> Self {
        Self::json(status, &ErrorBody::new(message)).unwrap_or(Self {
            status,
            body: Bytes::from_static(FALLBACK_ERROR),
        })
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status.0)
    }

    pub fn into_http(self) -> tiny_http::Response<Cursor<Bytes>> {
        let length = self.body.len();
        let headers = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
            .map(|header| vec![header])
            .unwrap_or_default();

        tiny_http::Response::new(self.status, headers, Cursor::new(self.body), Some(length), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_body() {
        let response = JsonResponse::json(OK, &json!(["stone,air,"])).unwrap();
        assert!(response.is_success());
        assert_eq!(&response.body[..], br#"["stone,air,"]"#);
    }

    #[test]
    fn test_error_body() {
        let response = JsonResponse::error(BAD_REQUEST, "xOffset must be an integer");
        assert!(!response.is_success());
        let body: ErrorBody = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body.error, "xOffset must be an integer");
    }

    #[test]
    fn test_into_http() {
        let response = JsonResponse::error(SERVICE_UNAVAILABLE, "Data pack is still loading");
        let length = response.body.len();

        let http = response.into_http();
        assert_eq!(http.status_code(), SERVICE_UNAVAILABLE);
        assert_eq!(http.data_length(), Some(length));
        assert!(http
            .headers()
            .iter()
            .any(|h| h.field.equiv("Content-Type") && h.value.as_str() == "application/json"));
    }
}
