use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::domain::error::ServiceError;

// ApiSuccess is a wrapper around a response that includes a status code.

#[derive(Debug, Clone)]
pub struct ApiSuccess<T: Serialize>(StatusCode, Json<T>);

impl<T: Serialize> ApiSuccess<T> {
    pub(crate) fn new(status: StatusCode, data: T) -> Self {
        ApiSuccess(status, Json(data))
    }

    pub(crate) fn ok(data: T) -> Self {
        Self::new(StatusCode::OK, data)
    }
}

impl<T: Serialize> IntoResponse for ApiSuccess<T> {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

// ApiError is a wrapper around a response that includes a status code.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    InternalServerError(String),
    UnprocessableEntity(String),
    ConflictWithServerState(String),
    ServiceUnavailable(String),
    Unauthorized,
    Forbidden,
    NotFound,
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::InternalServerError(e.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::NotFound => Self::NotFound,
            ServiceError::Forbidden => Self::Forbidden,
            ServiceError::Unauthorized => Self::Unauthorized,
            ServiceError::Conflict(cause) => Self::ConflictWithServerState(cause),
            ServiceError::Validation(cause) => Self::UnprocessableEntity(cause),
            ServiceError::TransientStorage(cause) => Self::ServiceUnavailable(cause),
        }
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ApiResponseBody::new_error(status, message))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use ApiError::*;

        match self {
            InternalServerError(e) => {
                tracing::error!("{}", e);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ServiceUnavailable(cause) => {
                tracing::warn!("storage unavailable: {}", cause);
                error_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Storage temporarily unavailable, retry later".to_string(),
                )
            }
            UnprocessableEntity(message) => {
                error_response(StatusCode::UNPROCESSABLE_ENTITY, message)
            }
            ConflictWithServerState(message) => error_response(StatusCode::CONFLICT, message),
            Unauthorized => {
                error_response(StatusCode::UNAUTHORIZED, "Authentication required".to_string())
            }
            Forbidden => error_response(StatusCode::FORBIDDEN, "Forbidden".to_string()),
            NotFound => error_response(StatusCode::NOT_FOUND, "Not found".to_string()),
        }
    }
}

// Generic response structure shared by all API error responses.

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponseBody<T: Serialize + PartialEq> {
    pub status_code: u16,
    pub data: T,
}

impl ApiResponseBody<ApiErrorData> {
    pub fn new_error(status_code: StatusCode, message: String) -> Self {
        Self {
            status_code: status_code.as_u16(),
            data: ApiErrorData { message },
        }
    }
}

/// The response data format for all error responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiErrorData {
    pub message: String,
}
