use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use types::errors::{EngineError, IdError, PoolError, StoreError, TopicError};

/// Central error type for the Gateway application
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    #[error("Bad request: {message}")]
    BadRequest { code: &'static str, message: String },

    #[error("Conflict: {message}")]
    Conflict { code: &'static str, message: String },

    #[error("Not waiting: {0}")]
    NotWaiting(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            code: "BAD_REQUEST",
            message: message.into(),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err {
            EngineError::Pool(PoolError::DuplicateEntry { .. }) => AppError::Conflict {
                code: "DUPLICATE_ENTRY",
                message,
            },
            EngineError::AlreadyWaiting { .. } => AppError::Conflict {
                code: "ALREADY_WAITING",
                message,
            },
            EngineError::NotWaiting { .. } | EngineError::Pool(PoolError::NotFound { .. } | PoolError::Empty) => {
                AppError::NotWaiting(message)
            }
            EngineError::ChannelClosed => AppError::InternalError(anyhow::Error::new(err)),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::Unavailable(_) => AppError::ServiceUnavailable(message),
            StoreError::AlreadyRegistered { .. } => AppError::Conflict {
                code: "ALREADY_REGISTERED",
                message,
            },
            StoreError::NameTaken { .. } => AppError::Conflict {
                code: "NAME_TAKEN",
                message,
            },
            StoreError::InvalidName(_) => AppError::BadRequest {
                code: "INVALID_NAME",
                message,
            },
            StoreError::InvalidGrade(_) => AppError::BadRequest {
                code: "INVALID_GRADE",
                message,
            },
        }
    }
}

impl From<TopicError> for AppError {
    fn from(err: TopicError) -> Self {
        AppError::BadRequest {
            code: "UNKNOWN_SUBJECT",
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest {
            code: "INVALID_BODY",
            message: rejection.body_text(),
        }
    }
}

impl From<IdError> for AppError {
    fn from(err: IdError) -> Self {
        AppError::Unauthorized(format!("Invalid participant id: {}", err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, "UNAUTHORIZED"),
            AppError::RateLimitExceeded(msg) => (StatusCode::TOO_MANY_REQUESTS, msg, "RATE_LIMIT_EXCEEDED"),
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, message, code),
            AppError::Conflict { code, message } => (StatusCode::CONFLICT, message, code),
            AppError::NotWaiting(msg) => (StatusCode::NOT_FOUND, msg, "NOT_WAITING"),
            AppError::Timeout(msg) => (StatusCode::REQUEST_TIMEOUT, msg, "WAIT_TIMEOUT"),
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg, "SERVICE_UNAVAILABLE"),
            AppError::InternalError(err) => {
                tracing::error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_ERROR",
                )
            }
        };

        let body = Json(json!({
            "error": code,
            "message": error_message
        }));

        (status, body).into_response()
    }
}
