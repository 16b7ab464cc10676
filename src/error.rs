use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{models::Envelope, response::send_json};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("user {0} not found")]
    NotFound(String),
}

/// Failures a handler reports to the client. The display text is the
/// message placed in the response envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Please provide first name, last name and biography for the user")]
    InvalidCreateBody(#[source] serde_json::Error),

    #[error("Please provide first name, last name and biography for the user")]
    InvalidUpdateBody(#[source] serde_json::Error),

    #[error("The user with the specified ID does not exist")]
    NotFound(#[from] StoreError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidCreateBody(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidUpdateBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::InvalidCreateBody(err) | ApiError::InvalidUpdateBody(err) => {
                tracing::warn!(error = %err, "malformed user payload");
            }
            ApiError::NotFound(err) => tracing::warn!(error = %err, "lookup failed"),
        }
        send_json(&Envelope::error(self.to_string()), self.status_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_error() -> serde_json::Error {
        serde_json::from_str::<crate::models::User>("{").unwrap_err()
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::InvalidCreateBody(decode_error()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidUpdateBody(decode_error()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(StoreError::NotFound("x".into())).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn messages_hide_internal_detail() {
        let err = ApiError::from(StoreError::NotFound("abc".into()));
        assert_eq!(err.to_string(), "The user with the specified ID does not exist");
    }
}
