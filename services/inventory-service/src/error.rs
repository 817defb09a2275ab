//! HTTP rendering of `DealsightError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use dealsight_utils::{DealsightError, ErrorResponse};

#[derive(Debug)]
pub struct ApiError(pub DealsightError);

pub type ApiResult<T> = Result<T, ApiError>;

impl From<DealsightError> for ApiError {
    fn from(error: DealsightError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        }
        (status, Json(ErrorResponse::from(self.0))).into_response()
    }
}
