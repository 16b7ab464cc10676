use std::any::Any;

use axum::{
    BoxError,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tower::timeout::error::Elapsed;

use crate::models::Envelope;

pub const GENERIC_ERROR: &str = "something went wrong";
pub const TIMEOUT_ERROR: &str = "request timed out";

/// Serializes `body` as the JSON response. If serialization fails the
/// client gets a 500 with a generic envelope instead.
pub fn send_json<T: Serialize>(body: &T, status: StatusCode) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => json_response(status, bytes),
        Err(err) => {
            tracing::error!(error = %err, "failed to marshal json data");
            // Best effort: a failure here leaves an empty body.
            let fallback = serde_json::to_vec(&Envelope::error(GENERIC_ERROR)).unwrap_or_default();
            json_response(StatusCode::INTERNAL_SERVER_ERROR, fallback)
        }
    }
}

fn json_response(status: StatusCode, bytes: Vec<u8>) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
        bytes,
    )
        .into_response()
}

/// Converts a handler panic into the generic 500 envelope.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        *s
    } else {
        "unknown panic"
    };
    tracing::error!(panic = %detail, "handler panicked");
    send_json(&Envelope::error(GENERIC_ERROR), StatusCode::INTERNAL_SERVER_ERROR)
}

/// Renders errors raised by the middleware stack, the request timeout
/// being the only expected one.
pub async fn middleware_error_response(err: BoxError) -> Response {
    if err.is::<Elapsed>() {
        tracing::warn!("request timed out");
        send_json(&Envelope::error(TIMEOUT_ERROR), StatusCode::REQUEST_TIMEOUT)
    } else {
        tracing::error!(error = %err, "unhandled middleware error");
        send_json(&Envelope::error(GENERIC_ERROR), StatusCode::INTERNAL_SERVER_ERROR)
    }
}
