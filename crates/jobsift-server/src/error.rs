use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use jobsift_core::error::FetchError;

use crate::dto::ErrorResponse;

/// Wrapper so we can implement `IntoResponse` for `FetchError`.
pub struct ApiError(pub FetchError);

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            FetchError::Validation(_)
            | FetchError::ItemParse(_)
            | FetchError::Serialization(_) => StatusCode::BAD_REQUEST,
            FetchError::NotFound(_) => StatusCode::NOT_FOUND,
            FetchError::ProviderUnavailable(_)
            | FetchError::ProviderRejected { .. }
            | FetchError::ProviderRunFailed { .. } => StatusCode::BAD_GATEWAY,
            FetchError::ProviderTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            FetchError::RunCreation(_) | FetchError::Database(_) | FetchError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorResponse {
            error: self.0.kind().to_string(),
            message: self.0.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}
