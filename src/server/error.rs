//! Mapping from internal errors to client-facing responses.
//!
//! Client input problems keep their specific message. Everything else is
//! logged in full and reported to the client with one generic message.

use crate::error::EarshotError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

pub const GENERIC_FAILURE: &str = "Failed to generate response. Please try again.";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error returned by handlers.
#[derive(Debug)]
pub struct ApiError(pub EarshotError);

impl From<EarshotError> for ApiError {
    fn from(e: EarshotError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            EarshotError::MissingFilePart => (StatusCode::BAD_REQUEST, "No file part"),
            EarshotError::EmptyFilename => (StatusCode::BAD_REQUEST, "No selected file"),
            EarshotError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Invalid upload"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        if self.0.is_client_error() {
            warn!(kind = self.0.kind(), "Rejected upload: {}", self.0);
        } else {
            error!(kind = self.0.kind(), "An error occurred: {}", self.0);
        }

        (
            status,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapped(e: EarshotError) -> (StatusCode, &'static str) {
        ApiError(e).status_and_message()
    }

    #[test]
    fn test_client_errors_keep_their_message() {
        assert_eq!(
            mapped(EarshotError::MissingFilePart),
            (StatusCode::BAD_REQUEST, "No file part")
        );
        assert_eq!(
            mapped(EarshotError::EmptyFilename),
            (StatusCode::BAD_REQUEST, "No selected file")
        );
    }

    #[test]
    fn test_internal_errors_collapse_to_generic_message() {
        let internal = [
            EarshotError::ProcessingFailed {
                asset: "files/x".to_string(),
                state: "FAILED".to_string(),
            },
            EarshotError::Timeout("poll".to_string()),
            EarshotError::Inference("quota".to_string()),
            EarshotError::Provider {
                status: 403,
                message: "API key not valid.".to_string(),
            },
            EarshotError::Unknown("boom".to_string()),
        ];

        for e in internal {
            assert_eq!(
                mapped(e),
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE)
            );
        }
    }
}
