use crate::auth::AuthError;
use analytics::AnalyticsError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Errors returned by the API handlers, mapped to a status code at the boundary
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Analytics(AnalyticsError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Analytics(AnalyticsError::PairingMismatch { .. }) => StatusCode::BAD_GATEWAY,
            ApiError::Analytics(AnalyticsError::Unavailable(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Auth(AuthError::Unauthenticated) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::InvalidToken(_)) => StatusCode::FORBIDDEN,
            ApiError::Auth(AuthError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            ApiError::Auth(AuthError::ProviderUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Auth(AuthError::Encoding(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Serialize)]
struct ApiErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        }

        let body = Json(ApiErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
