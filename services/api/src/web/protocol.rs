//! services/api/src/web/protocol.rs
//!
//! Defines the JSON response envelope shared by every endpoint and the
//! failure type handlers return. All responses carry the shape
//! `{ success, message?, data?, error? }`; the failure side maps the port
//! error taxonomy onto HTTP status codes.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use course_market_core::ports::PortError;
use serde::Serialize;

//=========================================================================================
// Success Envelope
//=========================================================================================

/// The success half of the response envelope.
#[derive(Serialize)]
pub struct ApiSuccess<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

/// 200 with a data payload.
pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<ApiSuccess<T>>) {
    (
        StatusCode::OK,
        Json(ApiSuccess {
            success: true,
            message: None,
            data,
        }),
    )
}

/// 201 with a data payload and a human-readable message.
pub fn created<T: Serialize>(message: &str, data: T) -> (StatusCode, Json<ApiSuccess<T>>) {
    (
        StatusCode::CREATED,
        Json(ApiSuccess {
            success: true,
            message: Some(message.to_string()),
            data,
        }),
    )
}

//=========================================================================================
// Request Body Extractor
//=========================================================================================

/// A JSON body extractor whose rejection stays inside the response
/// envelope: a missing or malformed body becomes a 400 with
/// `{ success: false, error }` instead of axum's plain-text 422.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiFailure;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiFailure::BadRequest(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

//=========================================================================================
// Failure Envelope
//=========================================================================================

#[derive(Serialize)]
struct ApiErrorBody {
    success: bool,
    error: String,
}

/// A handler failure, carried as a thiserror enum and rendered into the
/// envelope by `IntoResponse`.
#[derive(Debug, thiserror::Error)]
pub enum ApiFailure {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiFailure {
    fn status(&self) -> StatusCode {
        match self {
            ApiFailure::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiFailure::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiFailure::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiFailure::NotFound(_) => StatusCode::NOT_FOUND,
            ApiFailure::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            success: false,
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<PortError> for ApiFailure {
    fn from(e: PortError) -> Self {
        match e {
            // Validation failures and conflicts (duplicate enrollment,
            // duplicate email) are both client errors per the taxonomy.
            PortError::Validation(v) => ApiFailure::BadRequest(v.to_string()),
            PortError::Conflict(msg) => ApiFailure::BadRequest(msg),
            PortError::NotFound(msg) => ApiFailure::NotFound(msg),
            PortError::Unauthorized => ApiFailure::Unauthorized("Unauthorized".to_string()),
            // Store/infrastructure errors surface their message for
            // diagnostics; the full detail is logged at the call site.
            PortError::Unexpected(msg) => ApiFailure::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_market_core::domain::ValidationError;

    #[test]
    fn port_errors_map_to_expected_statuses() {
        let cases = [
            (
                ApiFailure::from(PortError::Validation(ValidationError::EmptyField("name"))),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiFailure::from(PortError::Conflict("already enrolled".to_string())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiFailure::from(PortError::NotFound("Course x not found".to_string())),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiFailure::from(PortError::Unauthorized),
                StatusCode::UNAUTHORIZED,
            ),
            (
                ApiFailure::from(PortError::Unexpected("db down".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (failure, expected) in cases {
            assert_eq!(failure.status(), expected);
        }
    }

    #[test]
    fn failure_body_carries_the_error_text() {
        let failure = ApiFailure::NotFound("Course abc not found".to_string());
        assert_eq!(failure.to_string(), "Course abc not found");
    }
}
