use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::ServiceError;
use crate::store::StoreError;
use prep_algo::EngineError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
    details: Option<serde_json::Value>,
    is_operational: bool,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::CONFLICT, "CONFLICT", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn insufficient_data(message: impl Into<String>, details: impl Serialize) -> Self {
        Self::operational(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INSUFFICIENT_DATA",
            message,
        )
        .with_details(details)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            details: None,
            is_operational: false,
        }
    }

    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    fn operational(
        status: StatusCode,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
            is_operational: true,
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Engine(EngineError::Validation(message)) => Self::validation(message),
            ServiceError::Engine(EngineError::InsufficientData(details)) => {
                Self::insufficient_data(
                    format!("not enough questions for topic {}", details.topic_id),
                    [details],
                )
            }
            ServiceError::InsufficientData(details) => Self::insufficient_data(
                "no candidate questions for any requested topic",
                details,
            ),
            ServiceError::UnknownTopic(topic_id) => Self::operational(
                StatusCode::NOT_FOUND,
                "TOPIC_NOT_FOUND",
                format!("unknown topic: {topic_id}"),
            ),
            ServiceError::ConcurrencyConflict { .. }
            | ServiceError::Store(StoreError::Conflict { .. }) => {
                tracing::warn!(error = %err, "request lost a write race");
                Self::conflict("the record was modified concurrently, retry the request")
            }
            ServiceError::Store(StoreError::Unavailable(message)) => {
                tracing::error!(error = %message, "store unavailable");
                Self::internal(message)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.is_operational {
            self.message
        } else {
            "internal server error".to_string()
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: self.code,
            details: self.details,
        };

        (self.status, Json(body)).into_response()
    }
}

pub fn json_error(
    status: StatusCode,
    code: impl Into<String>,
    message: impl Into<String>,
) -> AppError {
    AppError::operational(status, code, message)
}
