//! Payloads of the terrane chunk service.
//!
//! [`chunk`] holds the `/chunk` request validation and error body;
//! [`response`] turns them into JSON responses served through `tiny_http`.

#![warn(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::unwrap_in_result,
    clippy::unwrap_used,
    clippy::str_to_string,
    clippy::implicit_clone,
    clippy::manual_let_else,
    clippy::redundant_closure_for_method_calls
)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod chunk;
pub mod response;

pub use chunk::{ChunkRequest, ChunkResponse, ErrorBody, ValidationError};
pub use response::JsonResponse;
pub use tiny_http::{Method, StatusCode};
