//! HTTP API for the Vote Service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use lsb_common::Error;

pub mod completion;
pub mod health;
pub mod scores;
pub mod views;
pub mod votes;

pub use completion::get_completion_status;
pub use health::{health_check, health_routes};
pub use scores::{get_attribute_scores, list_divisions};
pub use views::get_cached_view;
pub use votes::{list_match_votes, submit_votes};

/// HTTP wrapper for the common error type
///
/// Duplicate votes never surface here; they are reported per attribute in
/// the success payload.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::UnknownReviewer => StatusCode::UNAUTHORIZED,
            Error::InactiveReviewer(_) => StatusCode::FORBIDDEN,
            Error::UnknownMatch(_) | Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::InvalidVoteValue(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Database(_) | Error::Io(_) | Error::Config(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        }

        let body = Json(json!({
            "error": self.0.to_string(),
        }));

        (status, body).into_response()
    }
}
